//! Transient per-invocation execution state.

use crate::fixed::Fixed;
use rustc_hash::FxHashMap;

/// State carried across the effects of a single firing.
///
/// Effects may record a selected target or scratch variables here; nothing
/// in a context survives past the invocation that created it. Preview
/// (`describe`) paths take a context by shared reference and must not
/// mutate it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    target: Option<String>,
    variables: FxHashMap<String, Fixed>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// The currently selected target, if any effect has set one.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = Some(target.into());
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// A named scratch variable; unset variables read as zero.
    pub fn variable(&self, name: &str) -> Fixed {
        self.variables.get(name).copied().unwrap_or(Fixed::ZERO)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Fixed) {
        self.variables.insert(name.into(), value);
    }
}
