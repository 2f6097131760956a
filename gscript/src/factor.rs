//! Weighted-score computation: a base value adjusted by conditional
//! modifiers. Factors drive weighted random choice and time-to-event
//! estimation.

use gstxt::Block;

use crate::condition::{AndCondition, Condition, ConditionRegistry};
use crate::error::ScriptError;
use crate::fixed::Fixed;

/// One conditional adjustment inside a factor.
pub struct FactorModifier<S> {
    condition: AndCondition<S>,
    adjustment: Fixed,
}

impl<S> FactorModifier<S> {
    pub fn new(condition: AndCondition<S>, adjustment: Fixed) -> Self {
        FactorModifier {
            condition,
            adjustment,
        }
    }
}

/// A scripted score: `base` plus every modifier whose condition holds.
///
/// Scripted form:
///
/// ```text
/// factor = {
///     base = 3
///     modifier = {
///         add = 2
///         has_trait = ambitious
///     }
/// }
/// ```
pub struct Factor<S> {
    base_value: i64,
    modifiers: Vec<FactorModifier<S>>,
}

impl<S: 'static> Factor<S> {
    pub fn new(base_value: i64) -> Self {
        Factor {
            base_value,
            modifiers: Vec::new(),
        }
    }

    pub fn base_value(&self) -> i64 {
        self.base_value
    }

    pub fn push(&mut self, modifier: FactorModifier<S>) {
        self.modifiers.push(modifier);
    }

    /// Builds a factor from a block: a `base` property (default 1) plus
    /// repeated `modifier` sub-blocks, each holding an `add` adjustment
    /// and its guard conditions.
    pub fn from_block(
        block: &Block,
        conditions: &ConditionRegistry<S>,
    ) -> Result<Self, ScriptError> {
        let mut base_value = 1i64;
        for property in &block.properties {
            match property.key.as_str() {
                "base" => {
                    base_value =
                        property
                            .value
                            .parse()
                            .map_err(|_| ScriptError::InvalidValue {
                                key: property.key.clone(),
                                value: property.value.clone(),
                            })?;
                }
                other => {
                    return Err(ScriptError::Schema {
                        kind: "factor property",
                        tag: other.to_string(),
                    });
                }
            }
        }
        let mut factor = Factor::new(base_value);
        for child in &block.children {
            if child.tag != "modifier" {
                return Err(ScriptError::Schema {
                    kind: "factor property",
                    tag: child.tag.clone(),
                });
            }
            let adjustment: Fixed = child
                .property_value("add")
                .ok_or_else(|| {
                    ScriptError::validation(
                        format!("factor modifier in `{}`", block.tag),
                        "missing `add` adjustment",
                    )
                })?
                .parse()
                .map_err(|_| ScriptError::InvalidValue {
                    key: "add".to_string(),
                    value: child.property_value("add").unwrap_or_default().to_string(),
                })?;
            let condition = AndCondition::new(
                conditions.build_children_filtered(child, &["add"])?,
            );
            factor.push(FactorModifier::new(condition, adjustment));
        }
        Ok(factor)
    }

    /// Starts from the base value and combines, in declaration order, every
    /// adjustment whose condition evaluates true against `scope`.
    pub fn calculate(&self, scope: &S) -> Fixed {
        let mut score = Fixed::from_int(self.base_value);
        for modifier in &self.modifiers {
            if modifier.condition.evaluate(scope) {
                score += modifier.adjustment;
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ScriptNode;

    struct Morale(i64);

    struct MoraleAtLeast(i64);

    impl Condition<Morale> for MoraleAtLeast {
        fn evaluate(&self, scope: &Morale) -> bool {
            scope.0 >= self.0
        }
        fn describe(&self, _scope: &Morale) -> String {
            format!("Morale is at least {}", self.0)
        }
    }

    fn registry() -> ConditionRegistry<Morale> {
        let mut registry = ConditionRegistry::new();
        registry.register("morale_at_least", |node: &ScriptNode| {
            let value = node
                .expect_value("condition")?
                .parse()
                .map_err(|_| ScriptError::InvalidValue {
                    key: "morale_at_least".to_string(),
                    value: node.value().unwrap_or_default().to_string(),
                })?;
            Ok(Box::new(MoraleAtLeast(value)) as Box<dyn Condition<Morale>>)
        });
        registry
    }

    #[test]
    fn no_modifiers_returns_base() {
        let factor = Factor::<Morale>::new(7);
        assert_eq!(factor.calculate(&Morale(0)), Fixed::from_int(7));
    }

    #[test]
    fn false_guard_leaves_score_unchanged() {
        let block = gstxt::parse_text(
            "factor = {\n\tbase = 4\n\tmodifier = {\n\t\tadd = 10\n\t\tmorale_at_least = 99\n\t}\n}",
        )
        .unwrap();
        let factor = Factor::from_block(&block.children[0], &registry()).unwrap();
        assert_eq!(factor.calculate(&Morale(1)), Fixed::from_int(4));
    }

    #[test]
    fn adjustments_are_additive_in_order() {
        let block = gstxt::parse_text(
            "factor = {\n\tbase = 2\n\tmodifier = { add = 3 morale_at_least = 1 }\n\tmodifier = { add = -0.5 morale_at_least = 5 }\n}",
        )
        .unwrap();
        let factor = Factor::from_block(&block.children[0], &registry()).unwrap();
        assert_eq!(factor.calculate(&Morale(1)), Fixed::from_int(5));
        assert_eq!(factor.calculate(&Morale(6)), Fixed(450));
    }

    #[test]
    fn unknown_factor_key_is_schema_error() {
        let block = gstxt::parse_text("factor = { root = 3 }").unwrap();
        assert!(matches!(
            Factor::from_block(&block.children[0], &registry()),
            Err(ScriptError::Schema { kind: "factor property", .. })
        ));
    }
}
