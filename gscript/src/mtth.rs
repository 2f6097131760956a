//! Mean time to happen: expected simulation turns until a scripted
//! occurrence fires.

use gstxt::Block;

use crate::condition::ConditionRegistry;
use crate::error::ScriptError;
use crate::factor::Factor;
use crate::fixed::Fixed;

/// Calendar collaborator converting months into simulation turns.
///
/// Turn length may vary by era, hence the year parameter.
pub trait GameClock {
    fn months_to_turns(&self, months: Fixed, current_year: i32) -> Fixed;
}

/// A clock where every month is the same number of turns.
pub struct UniformClock {
    pub turns_per_month: Fixed,
}

impl GameClock for UniformClock {
    fn months_to_turns(&self, months: Fixed, _current_year: i32) -> Fixed {
        months * self.turns_per_month
    }
}

/// A configured duration scaled by a scripted factor.
///
/// Scripted form: `days`/`months`/`years` properties (days divide by 30,
/// years multiply by 12; when several are given, the last one written
/// wins) plus an optional `factor` sub-block.
pub struct MeanTimeToHappen<S> {
    months: Fixed,
    factor: Factor<S>,
}

impl<S: 'static> MeanTimeToHappen<S> {
    pub fn from_block(
        block: &Block,
        conditions: &ConditionRegistry<S>,
    ) -> Result<Self, ScriptError> {
        let mut months = Fixed::ZERO;
        for property in &block.properties {
            let amount: Fixed =
                property
                    .value
                    .parse()
                    .map_err(|_| ScriptError::InvalidValue {
                        key: property.key.clone(),
                        value: property.value.clone(),
                    })?;
            months = match property.key.as_str() {
                "days" => amount / Fixed::from_int(30),
                "months" => amount,
                "years" => amount * Fixed::from_int(12),
                other => {
                    return Err(ScriptError::Schema {
                        kind: "mean time to happen property",
                        tag: other.to_string(),
                    });
                }
            };
        }
        let factor = match block.child("factor") {
            Some(factor_block) => Factor::from_block(factor_block, conditions)?,
            None => Factor::new(1),
        };
        for child in &block.children {
            if child.tag != "factor" {
                return Err(ScriptError::Schema {
                    kind: "mean time to happen property",
                    tag: child.tag.clone(),
                });
            }
        }
        Ok(MeanTimeToHappen { months, factor })
    }

    pub fn months(&self) -> Fixed {
        self.months
    }

    /// Expected number of turns until the occurrence fires.
    ///
    /// A zero duration means no time unit was ever configured; that is a
    /// configuration error, not "fires immediately".
    pub fn calculate(
        &self,
        scope: &S,
        current_year: i32,
        clock: &dyn GameClock,
    ) -> Result<Fixed, ScriptError> {
        if self.months == Fixed::ZERO {
            return Err(ScriptError::MissingDuration);
        }
        let score = self.factor.calculate(scope);
        Ok(clock.months_to_turns(self.months * score, current_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unit;

    fn registry() -> ConditionRegistry<Unit> {
        ConditionRegistry::new()
    }

    fn one_turn_per_month() -> UniformClock {
        UniformClock {
            turns_per_month: Fixed::ONE,
        }
    }

    #[test]
    fn one_year_base_factor_is_twelve_turns() {
        let block = gstxt::parse_text("mtth = { years = 1 }").unwrap();
        let mtth = MeanTimeToHappen::from_block(&block.children[0], &registry()).unwrap();
        let turns = mtth
            .calculate(&Unit, 450, &one_turn_per_month())
            .unwrap();
        assert_eq!(turns, Fixed::from_int(12));
    }

    #[test]
    fn days_divide_by_thirty() {
        let block = gstxt::parse_text("mtth = { days = 45 }").unwrap();
        let mtth = MeanTimeToHappen::from_block(&block.children[0], &registry()).unwrap();
        assert_eq!(mtth.months(), Fixed(150));
    }

    #[test]
    fn last_written_unit_wins() {
        let block = gstxt::parse_text("mtth = { years = 2 months = 5 }").unwrap();
        let mtth = MeanTimeToHappen::from_block(&block.children[0], &registry()).unwrap();
        assert_eq!(mtth.months(), Fixed::from_int(5));
    }

    #[test]
    fn no_duration_is_config_error() {
        let block = gstxt::parse_text("mtth = { }").unwrap();
        let mtth = MeanTimeToHappen::from_block(&block.children[0], &registry()).unwrap();
        assert!(matches!(
            mtth.calculate(&Unit, 450, &one_turn_per_month()),
            Err(ScriptError::MissingDuration)
        ));
    }

    #[test]
    fn clock_scales_turn_length() {
        let block = gstxt::parse_text("mtth = { months = 6 }").unwrap();
        let mtth = MeanTimeToHappen::from_block(&block.children[0], &registry()).unwrap();
        let clock = UniformClock {
            turns_per_month: Fixed::HALF,
        };
        assert_eq!(mtth.calculate(&Unit, 1200, &clock).unwrap(), Fixed::from_int(3));
    }
}
