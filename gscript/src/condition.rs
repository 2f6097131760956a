//! Scope-polymorphic boolean predicates over scripted data.
//!
//! A condition tree is built once at load time from a [`Block`] body and
//! then evaluated any number of times against a live scope. Evaluation is
//! pure: a condition never mutates the scope it inspects.

use gstxt::{Block, Property};
use rustc_hash::FxHashMap;

use crate::error::ScriptError;

/// A predicate over a scope of type `S`.
pub trait Condition<S> {
    /// Evaluates the predicate. Pure with respect to the scope.
    fn evaluate(&self, scope: &S) -> bool;

    /// Tooltip text mirroring the logical structure of `evaluate`.
    fn describe(&self, scope: &S) -> String;
}

/// A borrowed view of the two shapes a scripted construct can take:
/// a `key op value` property or a tagged sub-block.
#[derive(Clone, Copy)]
pub enum ScriptNode<'a> {
    Property(&'a Property),
    Block(&'a Block),
}

impl<'a> ScriptNode<'a> {
    /// The property key or block tag.
    pub fn tag(&self) -> &'a str {
        match self {
            ScriptNode::Property(p) => &p.key,
            ScriptNode::Block(b) => &b.tag,
        }
    }

    /// The property value; `None` for blocks.
    pub fn value(&self) -> Option<&'a str> {
        match self {
            ScriptNode::Property(p) => Some(&p.value),
            ScriptNode::Block(_) => None,
        }
    }

    /// The sub-block; `None` for properties.
    pub fn block(&self) -> Option<&'a Block> {
        match self {
            ScriptNode::Property(_) => None,
            ScriptNode::Block(b) => Some(b),
        }
    }

    /// The property value, or a schema error naming the construct.
    pub fn expect_value(&self, kind: &'static str) -> Result<&'a str, ScriptError> {
        self.value().ok_or_else(|| ScriptError::Schema {
            kind,
            tag: self.tag().to_string(),
        })
    }

    /// The sub-block, or a schema error naming the construct.
    pub fn expect_block(&self, kind: &'static str) -> Result<&'a Block, ScriptError> {
        self.block().ok_or_else(|| ScriptError::Schema {
            kind,
            tag: self.tag().to_string(),
        })
    }
}

/// Conjunction: true when every child is true. Empty AND is true.
pub struct AndCondition<S> {
    children: Vec<Box<dyn Condition<S>>>,
}

impl<S> AndCondition<S> {
    pub fn new(children: Vec<Box<dyn Condition<S>>>) -> Self {
        AndCondition { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<S> Condition<S> for AndCondition<S> {
    fn evaluate(&self, scope: &S) -> bool {
        // Declaration order, stop at the first false.
        self.children.iter().all(|c| c.evaluate(scope))
    }

    fn describe(&self, scope: &S) -> String {
        describe_children("All of:", &self.children, scope)
    }
}

/// Disjunction: true when any child is true. Empty OR is false.
pub struct OrCondition<S> {
    children: Vec<Box<dyn Condition<S>>>,
}

impl<S> OrCondition<S> {
    pub fn new(children: Vec<Box<dyn Condition<S>>>) -> Self {
        OrCondition { children }
    }
}

impl<S> Condition<S> for OrCondition<S> {
    fn evaluate(&self, scope: &S) -> bool {
        // Declaration order, stop at the first true.
        self.children.iter().any(|c| c.evaluate(scope))
    }

    fn describe(&self, scope: &S) -> String {
        describe_children("Any of:", &self.children, scope)
    }
}

/// Negation of a single child condition.
pub struct NotCondition<S> {
    child: Box<dyn Condition<S>>,
}

impl<S> NotCondition<S> {
    pub fn new(child: Box<dyn Condition<S>>) -> Self {
        NotCondition { child }
    }
}

impl<S> Condition<S> for NotCondition<S> {
    fn evaluate(&self, scope: &S) -> bool {
        !self.child.evaluate(scope)
    }

    fn describe(&self, scope: &S) -> String {
        format!("Not: {}", self.child.describe(scope))
    }
}

fn describe_children<S>(header: &str, children: &[Box<dyn Condition<S>>], scope: &S) -> String {
    if children.len() == 1 {
        return children[0].describe(scope);
    }
    let mut out = String::from(header);
    for child in children {
        out.push('\n');
        for line in child.describe(scope).lines() {
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
        // Drop the final newline; the joiner adds structure.
        out.pop();
    }
    out
}

type LeafBuilder<S> =
    Box<dyn Fn(&ScriptNode) -> Result<Box<dyn Condition<S>>, ScriptError>>;

/// Load-time builder for condition trees.
///
/// The composites `and`/`or`/`not` are built in; everything else resolves
/// through the leaf builders the host registered for its scope type.
pub struct ConditionRegistry<S> {
    builders: FxHashMap<String, LeafBuilder<S>>,
}

impl<S> Default for ConditionRegistry<S> {
    fn default() -> Self {
        ConditionRegistry {
            builders: FxHashMap::default(),
        }
    }
}

impl<S: 'static> ConditionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a leaf-condition builder under `tag`.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        builder: impl Fn(&ScriptNode) -> Result<Box<dyn Condition<S>>, ScriptError> + 'static,
    ) {
        self.builders.insert(tag.into(), Box::new(builder));
    }

    /// Builds a single condition from one property or sub-block.
    pub fn build_node(&self, node: &ScriptNode) -> Result<Box<dyn Condition<S>>, ScriptError> {
        match node.tag() {
            "and" => {
                let block = node.expect_block("condition")?;
                Ok(Box::new(AndCondition::new(self.build_children(block)?)))
            }
            "or" => {
                let block = node.expect_block("condition")?;
                Ok(Box::new(OrCondition::new(self.build_children(block)?)))
            }
            "not" => {
                // `not = { ... }` negates the conjunction of its body.
                let block = node.expect_block("condition")?;
                Ok(Box::new(NotCondition::new(Box::new(AndCondition::new(
                    self.build_children(block)?,
                )))))
            }
            tag => match self.builders.get(tag) {
                Some(builder) => builder(node),
                None => Err(ScriptError::Schema {
                    kind: "condition",
                    tag: tag.to_string(),
                }),
            },
        }
    }

    /// Builds every property and child of `block`, in declaration order.
    pub fn build_children(
        &self,
        block: &Block,
    ) -> Result<Vec<Box<dyn Condition<S>>>, ScriptError> {
        self.build_children_filtered(block, &[])
    }

    /// As `build_children`, skipping properties whose key is listed.
    ///
    /// Used by constructs that mix conditions with their own settings
    /// (e.g. factor modifiers).
    pub fn build_children_filtered(
        &self,
        block: &Block,
        skip_keys: &[&str],
    ) -> Result<Vec<Box<dyn Condition<S>>>, ScriptError> {
        let mut children: Vec<Box<dyn Condition<S>>> = Vec::new();
        for property in &block.properties {
            if skip_keys.contains(&property.key.as_str()) {
                continue;
            }
            children.push(self.build_node(&ScriptNode::Property(property))?);
        }
        for child in &block.children {
            children.push(self.build_node(&ScriptNode::Block(child))?);
        }
        Ok(children)
    }

    /// Builds a whole block body into a conjunction.
    pub fn build_block(&self, block: &Block) -> Result<AndCondition<S>, ScriptError> {
        Ok(AndCondition::new(self.build_children(block)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flag(bool);

    struct FlagIs(bool);

    impl Condition<Flag> for FlagIs {
        fn evaluate(&self, scope: &Flag) -> bool {
            scope.0 == self.0
        }
        fn describe(&self, _scope: &Flag) -> String {
            format!("Flag is {}", self.0)
        }
    }

    fn leaf(v: bool) -> Box<dyn Condition<Flag>> {
        Box::new(FlagIs(v))
    }

    #[test]
    fn empty_and_is_true() {
        let and = AndCondition::<Flag>::new(Vec::new());
        assert!(and.evaluate(&Flag(false)));
    }

    #[test]
    fn empty_or_is_false() {
        let or = OrCondition::<Flag>::new(Vec::new());
        assert!(!or.evaluate(&Flag(true)));
    }

    #[test]
    fn composites() {
        let scope = Flag(true);
        assert!(AndCondition::new(vec![leaf(true), leaf(true)]).evaluate(&scope));
        assert!(!AndCondition::new(vec![leaf(true), leaf(false)]).evaluate(&scope));
        assert!(OrCondition::new(vec![leaf(false), leaf(true)]).evaluate(&scope));
        assert!(!NotCondition::new(leaf(true)).evaluate(&scope));
    }

    #[test]
    fn negation_wraps_description() {
        let not = NotCondition::new(leaf(true));
        assert_eq!(not.describe(&Flag(true)), "Not: Flag is true");
    }

    #[test]
    fn unknown_leaf_is_schema_error() {
        let registry = ConditionRegistry::<Flag>::new();
        let block = gstxt::parse_text("mystery_condition = yes").unwrap();
        let err = match registry.build_block(&block) {
            Err(e) => e,
            Ok(_) => panic!("expected the unknown tag to be rejected"),
        };
        match err {
            ScriptError::Schema { kind, tag } => {
                assert_eq!(kind, "condition");
                assert_eq!(tag, "mystery_condition");
            }
            other => panic!("expected schema error, got {}", other),
        }
    }
}
