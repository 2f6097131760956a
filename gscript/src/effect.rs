//! Scope-polymorphic mutations and ordered effect lists.

use gstxt::Block;
use rustc_hash::FxHashMap;

use crate::condition::{AndCondition, Condition, ConditionRegistry, ScriptNode};
use crate::context::Context;
use crate::error::ScriptError;

/// A single scripted mutation of a scope.
pub trait Effect<S> {
    /// Applies the effect. May also record transient state in `ctx`.
    fn apply(&self, scope: &mut S, ctx: &mut Context);

    /// Preview text for tooltips. Must not mutate anything.
    fn describe(&self, scope: &S, ctx: &Context) -> String;
}

struct EffectEntry<S> {
    /// Guard condition; a failing guard skips this entry without error.
    guard: Option<AndCondition<S>>,
    effect: Box<dyn Effect<S>>,
}

/// An ordered sequence of effects applied strictly in declaration order.
pub struct EffectList<S> {
    entries: Vec<EffectEntry<S>>,
}

impl<S> Default for EffectList<S> {
    fn default() -> Self {
        EffectList {
            entries: Vec::new(),
        }
    }
}

impl<S> EffectList<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Applies every entry in order. An entry whose guard evaluates false
    /// is skipped; subsequent entries still run.
    pub fn apply(&self, scope: &mut S, ctx: &mut Context) {
        for entry in &self.entries {
            if let Some(guard) = &entry.guard {
                if !guard.evaluate(scope) {
                    continue;
                }
            }
            entry.effect.apply(scope, ctx);
        }
    }

    /// Renders the currently applicable entries, one per line.
    pub fn describe(&self, scope: &S, ctx: &Context) -> String {
        let mut lines = Vec::new();
        for entry in &self.entries {
            if let Some(guard) = &entry.guard {
                if !guard.evaluate(scope) {
                    continue;
                }
            }
            lines.push(entry.effect.describe(scope, ctx));
        }
        lines.join("\n")
    }
}

/// A list is itself an effect; `if` blocks nest this way.
impl<S> Effect<S> for EffectList<S> {
    fn apply(&self, scope: &mut S, ctx: &mut Context) {
        EffectList::apply(self, scope, ctx);
    }

    fn describe(&self, scope: &S, ctx: &Context) -> String {
        EffectList::describe(self, scope, ctx)
    }
}

type LeafBuilder<S> = Box<dyn Fn(&ScriptNode) -> Result<Box<dyn Effect<S>>, ScriptError>>;

/// Load-time builder for effect lists.
///
/// The `if` construct is built in: `if = { conditions = { ... } <effects> }`
/// guards the nested effects with the scripted conditions. Everything else
/// resolves through host-registered leaf builders.
pub struct EffectRegistry<S> {
    builders: FxHashMap<String, LeafBuilder<S>>,
}

impl<S> Default for EffectRegistry<S> {
    fn default() -> Self {
        EffectRegistry {
            builders: FxHashMap::default(),
        }
    }
}

impl<S: 'static> EffectRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a leaf-effect builder under `tag`.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        builder: impl Fn(&ScriptNode) -> Result<Box<dyn Effect<S>>, ScriptError> + 'static,
    ) {
        self.builders.insert(tag.into(), Box::new(builder));
    }

    fn build_node(
        &self,
        node: &ScriptNode,
        conditions: &ConditionRegistry<S>,
    ) -> Result<EffectEntry<S>, ScriptError> {
        if node.tag() == "if" {
            let block = node.expect_block("effect")?;
            let guard = match block.child("conditions") {
                Some(cond_block) => conditions.build_block(cond_block)?,
                None => AndCondition::new(Vec::new()),
            };
            let body =
                self.build_list_filtered(block, conditions, &[], &["conditions"])?;
            return Ok(EffectEntry {
                guard: Some(guard),
                effect: Box::new(body),
            });
        }
        match self.builders.get(node.tag()) {
            Some(builder) => Ok(EffectEntry {
                guard: None,
                effect: builder(node)?,
            }),
            None => Err(ScriptError::Schema {
                kind: "effect",
                tag: node.tag().to_string(),
            }),
        }
    }

    /// Builds a whole block body into an effect list, declaration order.
    pub fn build_list(
        &self,
        block: &Block,
        conditions: &ConditionRegistry<S>,
    ) -> Result<EffectList<S>, ScriptError> {
        self.build_list_filtered(block, conditions, &[], &[])
    }

    /// As `build_list`, skipping listed property keys and child tags.
    ///
    /// Constructs that mix effects with their own settings (event options,
    /// `if` blocks) use the filters for their reserved names.
    pub fn build_list_filtered(
        &self,
        block: &Block,
        conditions: &ConditionRegistry<S>,
        skip_keys: &[&str],
        skip_tags: &[&str],
    ) -> Result<EffectList<S>, ScriptError> {
        let mut entries = Vec::new();
        for property in &block.properties {
            if skip_keys.contains(&property.key.as_str()) {
                continue;
            }
            entries.push(self.build_node(&ScriptNode::Property(property), conditions)?);
        }
        for child in &block.children {
            if skip_tags.contains(&child.tag.as_str()) {
                continue;
            }
            entries.push(self.build_node(&ScriptNode::Block(child), conditions)?);
        }
        Ok(EffectList { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        total: i64,
        armed: bool,
    }

    struct AddOne;

    impl Effect<Counter> for AddOne {
        fn apply(&self, scope: &mut Counter, _ctx: &mut Context) {
            scope.total += 1;
        }
        fn describe(&self, _scope: &Counter, _ctx: &Context) -> String {
            "Add one".to_string()
        }
    }

    struct Armed;

    impl Condition<Counter> for Armed {
        fn evaluate(&self, scope: &Counter) -> bool {
            scope.armed
        }
        fn describe(&self, _scope: &Counter) -> String {
            "Is armed".to_string()
        }
    }

    fn registries() -> (EffectRegistry<Counter>, ConditionRegistry<Counter>) {
        let mut effects = EffectRegistry::new();
        effects.register("add_one", |_node| Ok(Box::new(AddOne) as Box<dyn Effect<Counter>>));
        let mut conditions = ConditionRegistry::new();
        conditions.register("armed", |_node| {
            Ok(Box::new(Armed) as Box<dyn Condition<Counter>>)
        });
        (effects, conditions)
    }

    #[test]
    fn applies_in_order() {
        let (effects, conditions) = registries();
        let block = gstxt::parse_text("add_one = yes\nadd_one = yes").unwrap();
        let list = effects.build_list(&block, &conditions).unwrap();
        let mut scope = Counter::default();
        let mut ctx = Context::new();
        list.apply(&mut scope, &mut ctx);
        assert_eq!(scope.total, 2);
    }

    #[test]
    fn failing_guard_skips_without_aborting() {
        let (effects, conditions) = registries();
        let block = gstxt::parse_text(
            "add_one = yes\nif = {\n\tconditions = { armed = yes }\n\tadd_one = yes\n}\nadd_one = yes",
        )
        .unwrap();
        let list = effects.build_list(&block, &conditions).unwrap();

        let mut scope = Counter::default();
        let mut ctx = Context::new();
        list.apply(&mut scope, &mut ctx);
        assert_eq!(scope.total, 2, "guarded entry skipped, later entries ran");

        scope = Counter {
            total: 0,
            armed: true,
        };
        list.apply(&mut scope, &mut ctx);
        assert_eq!(scope.total, 3);
    }

    #[test]
    fn unknown_effect_is_schema_error() {
        let (effects, conditions) = registries();
        let block = gstxt::parse_text("explode = yes").unwrap();
        match effects.build_list(&block, &conditions) {
            Err(ScriptError::Schema { kind, tag }) => {
                assert_eq!(kind, "effect");
                assert_eq!(tag, "explode");
            }
            other => panic!("expected schema error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn describe_does_not_mutate() {
        let (effects, conditions) = registries();
        let block = gstxt::parse_text("add_one = yes").unwrap();
        let list = effects.build_list(&block, &conditions).unwrap();
        let scope = Counter::default();
        let ctx = Context::new();
        assert_eq!(list.describe(&scope, &ctx), "Add one");
        assert_eq!(scope.total, 0);
    }
}
