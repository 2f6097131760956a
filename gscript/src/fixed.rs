//! Fixed-point arithmetic for deterministic script evaluation.
//!
//! Money, weights, and durations all use this type so that evaluating the
//! same script against the same scope gives identical results everywhere.
//! Floats are banned from interpreter logic.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Fixed-point value with two decimal digits of precision.
///
/// Represents decimal values as integers: 0.25 → 25, 1.00 → 100.
/// All arithmetic stays in the integer domain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fixed(pub i64);

impl Fixed {
    /// Scale factor: 100 = 1.00
    pub const SCALE: i64 = 100;

    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(100);
    pub const HALF: Fixed = Fixed(50);

    /// Create from raw scaled value
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// Create from integer (e.g., 5 → 500)
    #[inline]
    pub const fn from_int(v: i64) -> Self {
        Fixed(v * Self::SCALE)
    }

    /// Raw integer value
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Truncate to integer (rounds toward zero)
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 / Self::SCALE
    }

    /// Returns the smaller of two values
    #[inline]
    pub fn min(self, other: Fixed) -> Fixed {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Returns the larger of two values
    #[inline]
    pub fn max(self, other: Fixed) -> Fixed {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Saturating add (clamps at i64::MAX/MIN)
    #[inline]
    pub fn saturating_add(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(other.0))
    }

    /// Saturating subtract
    #[inline]
    pub fn saturating_sub(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(other.0))
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, other: Fixed) {
        self.0 += other.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0 - other.0)
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, other: Fixed) {
        self.0 -= other.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, other: Fixed) -> Fixed {
        Fixed((self.0 as i128 * other.0 as i128 / Fixed::SCALE as i128) as i64)
    }
}

impl MulAssign for Fixed {
    #[inline]
    fn mul_assign(&mut self, other: Fixed) {
        *self = *self * other;
    }
}

impl Div for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, other: Fixed) -> Fixed {
        if other.0 == 0 {
            return Fixed::ZERO; // Safe default for division by zero
        }
        Fixed((self.0 as i128 * Fixed::SCALE as i128 / other.0 as i128) as i64)
    }
}

impl DivAssign for Fixed {
    #[inline]
    fn div_assign(&mut self, other: Fixed) {
        *self = *self / other;
    }
}

/// Error parsing a decimal literal into [`Fixed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFixedError {
    pub input: String,
}

impl std::fmt::Display for ParseFixedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid fixed-point literal `{}`", self.input)
    }
}

impl std::error::Error for ParseFixedError {}

impl FromStr for Fixed {
    type Err = ParseFixedError;

    /// Accepts an optional sign, integer digits, and up to two fractional
    /// digits: `3`, `-0.5`, `+12.25`. More fractional digits than the type
    /// can represent exactly are rejected, not rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFixedError {
            input: s.to_string(),
        };
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if frac_part.len() > 2 {
            return Err(err());
        }
        // Signs only belong up front; both parts must be plain digits.
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }
        let int: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err())?
        };
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            let digits: i64 = frac_part.parse().map_err(|_| err())?;
            if frac_part.len() == 1 {
                digits * 10
            } else {
                digits
            }
        };
        let raw = int
            .checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(err)?;
        Ok(if negative { Fixed(-raw) } else { Fixed(raw) })
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fixed({} = {})", self.0, self)
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / Self::SCALE as u64,
            abs % Self::SCALE as u64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(Fixed::ZERO.0, 0);
        assert_eq!(Fixed::ONE.0, 100);
        assert_eq!(Fixed::HALF.0, 50);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("1".parse::<Fixed>().unwrap(), Fixed::ONE);
        assert_eq!("0.25".parse::<Fixed>().unwrap(), Fixed(25));
        assert_eq!("0.5".parse::<Fixed>().unwrap(), Fixed::HALF);
        assert_eq!("-3.10".parse::<Fixed>().unwrap(), Fixed(-310));
        assert_eq!("+2".parse::<Fixed>().unwrap(), Fixed::from_int(2));
        assert_eq!(".75".parse::<Fixed>().unwrap(), Fixed(75));
    }

    #[test]
    fn test_from_str_rejects() {
        assert!("".parse::<Fixed>().is_err());
        assert!("-".parse::<Fixed>().is_err());
        assert!(".".parse::<Fixed>().is_err());
        assert!("abc".parse::<Fixed>().is_err());
        assert!("1.234".parse::<Fixed>().is_err(), "too many frac digits");
        assert!("1.2.3".parse::<Fixed>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Fixed(25).to_string(), "0.25");
        assert_eq!(Fixed(-310).to_string(), "-3.10");
        assert_eq!(Fixed::from_int(12).to_string(), "12.00");
    }

    #[test]
    fn test_multiply() {
        // 2.0 × 3.0 = 6.0
        assert_eq!(Fixed::from_int(2) * Fixed::from_int(3), Fixed::from_int(6));
        // 0.5 × 0.5 = 0.25
        assert_eq!(Fixed::HALF * Fixed::HALF, Fixed(25));
    }

    #[test]
    fn test_divide() {
        assert_eq!(Fixed::from_int(6) / Fixed::from_int(2), Fixed::from_int(3));
        assert_eq!(Fixed::ONE / Fixed::from_int(4), Fixed(25));
    }

    // Property-based tests - exploring the input space
    mod properties {
        use super::*;
        use proptest::prelude::*;

        // Reasonable script values (-1M to 1M)
        fn script_value() -> impl Strategy<Value = i64> {
            -1_000_000..=1_000_000i64
        }

        proptest! {
            /// Multiplication never overflows (i128 intermediate)
            #[test]
            fn mul_never_panics(a in script_value(), b in script_value()) {
                let x = Fixed::from_int(a);
                let y = Fixed::from_int(b);
                let _ = x * y;
            }

            /// Multiplication is commutative
            #[test]
            fn mul_is_commutative(a in script_value(), b in script_value()) {
                let x = Fixed::from_int(a);
                let y = Fixed::from_int(b);
                prop_assert_eq!(x * y, y * x);
            }

            /// Multiplication by ONE is identity
            #[test]
            fn mul_one_is_identity(a in script_value()) {
                let x = Fixed::from_int(a);
                prop_assert_eq!(x * Fixed::ONE, x);
            }

            /// Division by ZERO returns ZERO (safe fallback)
            #[test]
            fn div_zero_is_safe(a in script_value()) {
                let x = Fixed::from_int(a);
                prop_assert_eq!(x / Fixed::ZERO, Fixed::ZERO);
            }

            /// Division by ONE is identity
            #[test]
            fn div_one_is_identity(a in script_value()) {
                let x = Fixed::from_int(a);
                prop_assert_eq!(x / Fixed::ONE, x);
            }

            /// Saturating operations never panic
            #[test]
            fn saturating_ops_never_panic(a in script_value(), b in script_value()) {
                let x = Fixed::from_int(a);
                let y = Fixed::from_int(b);
                let _ = x.saturating_add(y);
                let _ = x.saturating_sub(y);
            }

            /// Display → FromStr round-trips exactly
            #[test]
            fn display_round_trips(raw in -100_000_000..=100_000_000i64) {
                let original = Fixed(raw);
                let reparsed: Fixed = original.to_string().parse().unwrap();
                prop_assert_eq!(original, reparsed);
            }
        }
    }
}
