//! Bundles of numeric modifier-effects with human-readable breakdowns.
//!
//! A modifier is applied to a scope with an integer multiplier and removed
//! by applying with the multiplier negated; the two are exact inverses for
//! every touched field.

use gstxt::Block;
use rustc_hash::FxHashMap;

use crate::error::ScriptError;
use crate::fixed::Fixed;

/// One numeric delta paired with a description label.
pub trait ModifierEffect<S> {
    /// Applies the configured delta scaled by `multiplier`.
    fn apply(&self, scope: &mut S, multiplier: i64);

    /// The configured (unmultiplied) delta.
    fn delta(&self) -> Fixed;

    /// Human-readable label for the breakdown string.
    fn label(&self) -> &str;
}

/// A modifier effect that adds `delta × multiplier` to one numeric field.
///
/// Additive application makes apply/remove inverses by construction.
pub struct FieldModifierEffect<S> {
    label: String,
    delta: Fixed,
    add: fn(&mut S, Fixed),
}

impl<S> FieldModifierEffect<S> {
    pub fn new(label: impl Into<String>, delta: Fixed, add: fn(&mut S, Fixed)) -> Self {
        FieldModifierEffect {
            label: label.into(),
            delta,
            add,
        }
    }
}

impl<S> ModifierEffect<S> for FieldModifierEffect<S> {
    fn apply(&self, scope: &mut S, multiplier: i64) {
        (self.add)(scope, self.delta * Fixed::from_int(multiplier));
    }

    fn delta(&self) -> Fixed {
        self.delta
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// An ordered bundle of modifier effects.
pub struct Modifier<S> {
    /// Script identifier; empty for anonymous modifiers.
    pub name: String,
    effects: Vec<Box<dyn ModifierEffect<S>>>,
}

impl<S> Modifier<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Modifier {
            name: name.into(),
            effects: Vec::new(),
        }
    }

    pub fn push(&mut self, effect: Box<dyn ModifierEffect<S>>) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Applies every effect in order, scaled by `multiplier`.
    pub fn apply(&self, scope: &mut S, multiplier: i64) {
        for effect in &self.effects {
            effect.apply(scope, multiplier);
        }
    }

    /// Exact inverse of [`Modifier::apply`] with the same multiplier.
    pub fn remove(&self, scope: &mut S, multiplier: i64) {
        self.apply(scope, -multiplier);
    }

    /// Deterministic breakdown: one line per effect, delta multiplied by
    /// `multiplier`, indented `indent` tab levels. Lines whose effective
    /// delta is exactly zero are omitted.
    pub fn get_string(&self, multiplier: i64, indent: usize) -> String {
        let mut out = String::new();
        for effect in &self.effects {
            let effective = effect.delta() * Fixed::from_int(multiplier);
            if effective == Fixed::ZERO {
                continue;
            }
            for _ in 0..indent {
                out.push('\t');
            }
            let sign = if effective > Fixed::ZERO { "+" } else { "" };
            out.push_str(&format!("{}: {}{}\n", effect.label(), sign, effective));
        }
        out
    }
}

type EffectBuilder<S> = Box<dyn Fn(Fixed) -> Box<dyn ModifierEffect<S>>>;

/// Load-time builder mapping scripted keys to modifier effects.
///
/// A modifier block is a flat list of `key = delta` properties:
///
/// ```text
/// prosperous_harvest = {
///     gold_income = 0.25
///     stability = -1
/// }
/// ```
pub struct ModifierEffectRegistry<S> {
    builders: FxHashMap<String, EffectBuilder<S>>,
}

impl<S> Default for ModifierEffectRegistry<S> {
    fn default() -> Self {
        ModifierEffectRegistry {
            builders: FxHashMap::default(),
        }
    }
}

impl<S> ModifierEffectRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a modifier-effect constructor under `key`.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        builder: impl Fn(Fixed) -> Box<dyn ModifierEffect<S>> + 'static,
    ) {
        self.builders.insert(key.into(), Box::new(builder));
    }

    /// Registers an additive field effect with a display label.
    pub fn register_field(
        &mut self,
        key: impl Into<String>,
        label: &'static str,
        add: fn(&mut S, Fixed),
    ) where
        S: 'static,
    {
        self.register(key, move |delta| {
            Box::new(FieldModifierEffect::new(label, delta, add))
        });
    }

    /// Builds a modifier from the properties of `block`, using the block
    /// tag as the modifier name (empty = anonymous).
    pub fn build(&self, block: &Block) -> Result<Modifier<S>, ScriptError> {
        let mut modifier = Modifier::new(block.tag.clone());
        for property in &block.properties {
            let builder =
                self.builders
                    .get(&property.key)
                    .ok_or_else(|| ScriptError::Schema {
                        kind: "modifier effect",
                        tag: property.key.clone(),
                    })?;
            let delta: Fixed =
                property
                    .value
                    .parse()
                    .map_err(|_| ScriptError::InvalidValue {
                        key: property.key.clone(),
                        value: property.value.clone(),
                    })?;
            modifier.push(builder(delta));
        }
        Ok(modifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, PartialEq, Debug, Clone)]
    struct Treasury {
        gold: Fixed,
        upkeep: Fixed,
    }

    fn registry() -> ModifierEffectRegistry<Treasury> {
        let mut registry = ModifierEffectRegistry::new();
        registry.register_field("gold", "Gold", |s: &mut Treasury, d| s.gold += d);
        registry.register_field("upkeep", "Upkeep", |s: &mut Treasury, d| s.upkeep += d);
        registry
    }

    fn sample() -> Modifier<Treasury> {
        let block = gstxt::parse_text("windfall = {\n\tgold = 2.50\n\tupkeep = -0.75\n}")
            .unwrap();
        registry().build(&block.children[0]).unwrap()
    }

    #[test]
    fn apply_then_remove_restores_state() {
        let modifier = sample();
        for multiplier in [-3i64, -1, 0, 1, 4] {
            let mut scope = Treasury {
                gold: Fixed::from_int(10),
                upkeep: Fixed(125),
            };
            let before = scope.clone();
            modifier.apply(&mut scope, multiplier);
            modifier.remove(&mut scope, multiplier);
            assert_eq!(scope, before, "multiplier {}", multiplier);
        }
    }

    #[test]
    fn apply_scales_by_multiplier() {
        let modifier = sample();
        let mut scope = Treasury::default();
        modifier.apply(&mut scope, 2);
        assert_eq!(scope.gold, Fixed::from_int(5));
        assert_eq!(scope.upkeep, Fixed(-150));
    }

    #[test]
    fn get_string_layout() {
        let modifier = sample();
        assert_eq!(modifier.get_string(1, 0), "Gold: +2.50\nUpkeep: -0.75\n");
        assert_eq!(modifier.get_string(2, 1), "\tGold: +5.00\n\tUpkeep: -1.50\n");
        // Zero multiplier zeroes every line out.
        assert_eq!(modifier.get_string(0, 0), "");
    }

    #[test]
    fn get_string_is_pure() {
        let modifier = sample();
        assert_eq!(modifier.get_string(3, 2), modifier.get_string(3, 2));
    }

    #[test]
    fn unknown_key_is_schema_error() {
        let block = gstxt::parse_text("oops = { sparkle = 1 }").unwrap();
        assert!(matches!(
            registry().build(&block.children[0]),
            Err(ScriptError::Schema { kind: "modifier effect", .. })
        ));
    }

    #[test]
    fn bad_delta_is_invalid_value() {
        let block = gstxt::parse_text("oops = { gold = shiny }").unwrap();
        assert!(matches!(
            registry().build(&block.children[0]),
            Err(ScriptError::InvalidValue { .. })
        ));
    }
}
