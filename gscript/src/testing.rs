//! A ready-made scope and scripting vocabulary for tests.
//!
//! Hosts monomorphize the frameworks over their own entity types; this
//! module provides a small country-like scope with every kind of leaf
//! registered, so the frameworks can be exercised end to end without a
//! full game state.

use rustc_hash::FxHashMap;

use crate::condition::{Condition, ConditionRegistry, ScriptNode};
use crate::context::Context;
use crate::effect::{Effect, EffectRegistry};
use crate::error::ScriptError;
use crate::fixed::Fixed;
use crate::modifier::ModifierEffectRegistry;

/// A minimal country-like scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestScope {
    pub traits: Vec<String>,
    pub gold: Fixed,
    pub gold_income: Fixed,
    pub stability: Fixed,
    pub opinions: FxHashMap<String, i64>,
}

impl TestScope {
    pub fn with_traits(traits: &[&str]) -> Self {
        TestScope {
            traits: traits.iter().map(|t| t.to_string()).collect(),
            ..TestScope::default()
        }
    }

    pub fn opinion_of(&self, other: &str) -> i64 {
        self.opinions.get(other).copied().unwrap_or(0)
    }
}

struct HasTrait(String);

impl Condition<TestScope> for HasTrait {
    fn evaluate(&self, scope: &TestScope) -> bool {
        scope.traits.iter().any(|t| t == &self.0)
    }
    fn describe(&self, _scope: &TestScope) -> String {
        format!("Has the {} trait", self.0)
    }
}

struct GoldAtLeast(Fixed);

impl Condition<TestScope> for GoldAtLeast {
    fn evaluate(&self, scope: &TestScope) -> bool {
        scope.gold >= self.0
    }
    fn describe(&self, _scope: &TestScope) -> String {
        format!("Has at least {} gold", self.0)
    }
}

struct OpinionOf {
    who: String,
    at_least: i64,
}

impl Condition<TestScope> for OpinionOf {
    fn evaluate(&self, scope: &TestScope) -> bool {
        scope.opinion_of(&self.who) >= self.at_least
    }
    fn describe(&self, _scope: &TestScope) -> String {
        format!("Opinion of {} is at least {}", self.who, self.at_least)
    }
}

struct Always(bool);

impl Condition<TestScope> for Always {
    fn evaluate(&self, _scope: &TestScope) -> bool {
        self.0
    }
    fn describe(&self, _scope: &TestScope) -> String {
        if self.0 { "Always" } else { "Never" }.to_string()
    }
}

/// Condition vocabulary: `has_trait`, `gold_at_least`, `opinion_of`
/// (block form), `always`.
pub fn condition_registry() -> ConditionRegistry<TestScope> {
    let mut registry = ConditionRegistry::new();
    registry.register("has_trait", |node: &ScriptNode| {
        let name = node.expect_value("condition")?;
        Ok(Box::new(HasTrait(name.to_string())) as Box<dyn Condition<TestScope>>)
    });
    registry.register("gold_at_least", |node: &ScriptNode| {
        let value = parse_fixed("gold_at_least", node.expect_value("condition")?)?;
        Ok(Box::new(GoldAtLeast(value)) as Box<dyn Condition<TestScope>>)
    });
    registry.register("opinion_of", |node: &ScriptNode| {
        let block = node.expect_block("condition")?;
        let who = block
            .property_value("who")
            .ok_or_else(|| ScriptError::validation("opinion_of", "missing `who`"))?;
        let at_least = block.property_int("value").ok_or_else(|| {
            ScriptError::validation("opinion_of", "missing or bad `value`")
        })?;
        Ok(Box::new(OpinionOf {
            who: who.to_string(),
            at_least,
        }) as Box<dyn Condition<TestScope>>)
    });
    registry.register("always", |node: &ScriptNode| {
        let value = match node.expect_value("condition")? {
            "yes" => true,
            "no" => false,
            other => {
                return Err(ScriptError::InvalidValue {
                    key: "always".to_string(),
                    value: other.to_string(),
                });
            }
        };
        Ok(Box::new(Always(value)) as Box<dyn Condition<TestScope>>)
    });
    registry
}

struct GainGold(Fixed);

impl Effect<TestScope> for GainGold {
    fn apply(&self, scope: &mut TestScope, _ctx: &mut Context) {
        scope.gold += self.0;
    }
    fn describe(&self, _scope: &TestScope, _ctx: &Context) -> String {
        format!("Gain {} gold", self.0)
    }
}

struct AddTrait(String);

impl Effect<TestScope> for AddTrait {
    fn apply(&self, scope: &mut TestScope, _ctx: &mut Context) {
        if !scope.traits.iter().any(|t| t == &self.0) {
            scope.traits.push(self.0.clone());
        }
    }
    fn describe(&self, _scope: &TestScope, _ctx: &Context) -> String {
        format!("Gain the {} trait", self.0)
    }
}

struct SetOpinion {
    who: String,
    value: i64,
}

impl Effect<TestScope> for SetOpinion {
    fn apply(&self, scope: &mut TestScope, _ctx: &mut Context) {
        scope.opinions.insert(self.who.clone(), self.value);
    }
    fn describe(&self, _scope: &TestScope, _ctx: &Context) -> String {
        format!("Set opinion of {} to {}", self.who, self.value)
    }
}

struct SelectTarget(String);

impl Effect<TestScope> for SelectTarget {
    fn apply(&self, _scope: &mut TestScope, ctx: &mut Context) {
        ctx.set_target(self.0.clone());
    }
    fn describe(&self, _scope: &TestScope, _ctx: &Context) -> String {
        format!("Select {}", self.0)
    }
}

/// Effect vocabulary: `gain_gold`, `add_trait`, `set_opinion` (block
/// form), `select_target`.
pub fn effect_registry() -> EffectRegistry<TestScope> {
    let mut registry = EffectRegistry::new();
    registry.register("gain_gold", |node: &ScriptNode| {
        let amount = parse_fixed("gain_gold", node.expect_value("effect")?)?;
        Ok(Box::new(GainGold(amount)) as Box<dyn Effect<TestScope>>)
    });
    registry.register("add_trait", |node: &ScriptNode| {
        let name = node.expect_value("effect")?;
        Ok(Box::new(AddTrait(name.to_string())) as Box<dyn Effect<TestScope>>)
    });
    registry.register("set_opinion", |node: &ScriptNode| {
        let block = node.expect_block("effect")?;
        let who = block
            .property_value("who")
            .ok_or_else(|| ScriptError::validation("set_opinion", "missing `who`"))?;
        let value = block.property_int("value").ok_or_else(|| {
            ScriptError::validation("set_opinion", "missing or bad `value`")
        })?;
        Ok(Box::new(SetOpinion {
            who: who.to_string(),
            value,
        }) as Box<dyn Effect<TestScope>>)
    });
    registry.register("select_target", |node: &ScriptNode| {
        let target = node.expect_value("effect")?;
        Ok(Box::new(SelectTarget(target.to_string())) as Box<dyn Effect<TestScope>>)
    });
    registry
}

/// Modifier vocabulary: `gold_income`, `stability`.
pub fn modifier_registry() -> ModifierEffectRegistry<TestScope> {
    let mut registry = ModifierEffectRegistry::new();
    registry.register_field("gold_income", "Gold income", |s: &mut TestScope, d| {
        s.gold_income += d
    });
    registry.register_field("stability", "Stability", |s: &mut TestScope, d| {
        s.stability += d
    });
    registry
}

fn parse_fixed(key: &str, value: &str) -> Result<Fixed, ScriptError> {
    value.parse().map_err(|_| ScriptError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
