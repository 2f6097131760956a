//! # Scripting interpretation core
//!
//! The data-driven scripting layer of the simulation engine: scripted
//! data parsed by [`gstxt`] is built, at load time, into trees of
//! conditions, effects, modifiers, and factors, all generic over the
//! scope type (country, character, province, ...) they run against.
//!
//! ```text
//! scripted text ──gstxt──▶ Block tree ──registries──▶ typed trees
//!                                                        │
//!                              booleans / mutations / ◀──┘ runtime,
//!                              scores / tooltip text       per scope
//! ```
//!
//! ## Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Fixed`] | Deterministic fixed-point numerics (scale 100) |
//! | [`Condition`] / [`ConditionRegistry`] | Pure predicates over a scope |
//! | [`EffectList`] / [`EffectRegistry`] | Ordered scope mutations |
//! | [`Modifier`] | Reversible numeric bundles with tooltip breakdowns |
//! | [`Factor`] | Base value + conditional adjustments (weights) |
//! | [`MeanTimeToHappen`] | Factor-scaled expected turns until firing |
//! | [`EventDatabase`] / [`TriggerRegistry`] | Event ownership and firing |
//!
//! Everything evaluates single-threaded and synchronously; scripting
//! structures are immutable after load, and all randomness flows through
//! a caller-supplied seedable RNG so runs replay exactly.

pub mod condition;
pub mod context;
pub mod effect;
pub mod error;
pub mod event;
pub mod factor;
pub mod fixed;
pub mod modifier;
pub mod mtth;
pub mod testing;

pub use condition::{
    AndCondition, Condition, ConditionRegistry, NotCondition, OrCondition, ScriptNode,
};
pub use context::Context;
pub use effect::{Effect, EffectList, EffectRegistry};
pub use error::ScriptError;
pub use event::{
    fire_trigger, pick_random_event, weighted_choice, Event, EventDatabase, EventId,
    EventOption, EventTrigger, TriggerRegistry,
};
pub use factor::{Factor, FactorModifier};
pub use fixed::Fixed;
pub use modifier::{FieldModifierEffect, Modifier, ModifierEffect, ModifierEffectRegistry};
pub use mtth::{GameClock, MeanTimeToHappen, UniformClock};
