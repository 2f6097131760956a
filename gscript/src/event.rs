//! The event subsystem: trigger registries, scripted events, weighted
//! random selection, and AI option picking.
//!
//! Events are owned by an [`EventDatabase`]; every other structure refers
//! to them by [`EventId`] (arena indices), so the trigger registry never
//! owns an event. Trigger names are registered up front, once per load
//! cycle; looking up an unknown trigger at firing time yields no events,
//! but an event that *names* an unregistered trigger fails `check()`.

use gstxt::Block;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::condition::{AndCondition, Condition, ConditionRegistry};
use crate::context::Context;
use crate::effect::{EffectList, EffectRegistry};
use crate::error::ScriptError;
use crate::factor::Factor;
use crate::fixed::Fixed;

/// Index of an event inside its owning [`EventDatabase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub usize);

/// One choice presented when an event fires.
pub struct EventOption<S> {
    pub name: String,
    /// Relative weight for AI option picking. Defaults to 1.
    pub ai_weight: u32,
    pub tooltip: String,
    pub effects: EffectList<S>,
}

impl<S: 'static> EventOption<S> {
    fn from_block(
        block: &Block,
        conditions: &ConditionRegistry<S>,
        effects: &EffectRegistry<S>,
    ) -> Result<Self, ScriptError> {
        let ai_weight = match block.property_value("ai_weight") {
            Some(value) => value.parse().map_err(|_| ScriptError::InvalidValue {
                key: "ai_weight".to_string(),
                value: value.to_string(),
            })?,
            None => 1,
        };
        Ok(EventOption {
            name: block.property_value("name").unwrap_or_default().to_string(),
            ai_weight,
            tooltip: block
                .property_value("tooltip")
                .unwrap_or_default()
                .to_string(),
            effects: effects.build_list_filtered(
                block,
                conditions,
                &["name", "ai_weight", "tooltip"],
                &[],
            )?,
        })
    }
}

/// A scripted event, parameterized over the scope type it fires against.
///
/// Scripted form:
///
/// ```text
/// plague_outbreak = {
///     trigger = yearly_pulse
///     conditions = { ... }
///     immediate = { ... }
///     random_weight = { base = 2 ... }
///     option = {
///         name = quarantine
///         ai_weight = 3
///         ...effects...
///     }
/// }
/// ```
pub struct Event<S> {
    /// Script identifier (the block tag).
    pub id: String,
    /// Name of the trigger this event is filed under.
    pub trigger: String,
    pub hidden: bool,
    conditions: Option<AndCondition<S>>,
    immediate_effects: EffectList<S>,
    options: Vec<EventOption<S>>,
    random_weight: Option<Factor<S>>,
}

impl<S: 'static> Event<S> {
    /// Builds an event from its scripted block (Unloaded → Loaded).
    pub fn from_block(
        block: &Block,
        conditions: &ConditionRegistry<S>,
        effects: &EffectRegistry<S>,
    ) -> Result<Self, ScriptError> {
        let mut event = Event {
            id: block.tag.clone(),
            trigger: String::new(),
            hidden: false,
            conditions: None,
            immediate_effects: EffectList::new(),
            options: Vec::new(),
            random_weight: None,
        };
        for property in &block.properties {
            match property.key.as_str() {
                "trigger" => event.trigger = property.value.clone(),
                "hidden" => {
                    event.hidden = match property.value.as_str() {
                        "yes" => true,
                        "no" => false,
                        other => {
                            return Err(ScriptError::InvalidValue {
                                key: "hidden".to_string(),
                                value: other.to_string(),
                            });
                        }
                    };
                }
                other => {
                    return Err(ScriptError::Schema {
                        kind: "event property",
                        tag: other.to_string(),
                    });
                }
            }
        }
        for child in &block.children {
            match child.tag.as_str() {
                "conditions" => {
                    event.conditions = Some(conditions.build_block(child)?);
                }
                "immediate" => {
                    event.immediate_effects = effects.build_list(child, conditions)?;
                }
                "option" => {
                    event
                        .options
                        .push(EventOption::from_block(child, conditions, effects)?);
                }
                "random_weight" => {
                    event.random_weight = Some(Factor::from_block(child, conditions)?);
                }
                other => {
                    return Err(ScriptError::Schema {
                        kind: "event scope",
                        tag: other.to_string(),
                    });
                }
            }
        }
        Ok(event)
    }

    /// Whether this event is picked by weighted random selection rather
    /// than fired deterministically.
    pub fn is_random(&self) -> bool {
        self.random_weight.is_some()
    }

    pub fn options(&self) -> &[EventOption<S>] {
        &self.options
    }

    /// True when the event's conditions hold (an event with no conditions
    /// always fires when its trigger occurs).
    pub fn conditions_hold(&self, scope: &S) -> bool {
        match &self.conditions {
            Some(conditions) => conditions.evaluate(scope),
            None => true,
        }
    }

    /// This event's weight in a random pool, or zero when ineligible.
    pub fn random_weight(&self, scope: &S) -> Fixed {
        match &self.random_weight {
            Some(factor) => factor.calculate(scope).max(Fixed::ZERO),
            None => Fixed::ZERO,
        }
    }

    /// Validates post-load invariants (Loaded → Checked).
    pub fn check(&self, triggers: &TriggerRegistry) -> Result<(), ScriptError> {
        if self.trigger.is_empty() {
            return Err(ScriptError::validation(&self.id, "missing `trigger`"));
        }
        if !triggers.is_registered(&self.trigger) {
            return Err(ScriptError::validation(
                &self.id,
                format!("unknown trigger `{}`", self.trigger),
            ));
        }
        if !self.hidden && self.options.is_empty() {
            return Err(ScriptError::validation(
                &self.id,
                "a non-hidden event must have at least one option",
            ));
        }
        for option in &self.options {
            if !self.hidden && option.name.is_empty() {
                return Err(ScriptError::validation(&self.id, "option missing `name`"));
            }
        }
        Ok(())
    }

    /// Weighted AI pick among the options. `None` when there are none.
    pub fn pick_option(&self, rng: &mut impl Rng) -> Option<&EventOption<S>> {
        let pool: Vec<(usize, i64)> = self
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| (i, o.ai_weight as i64))
            .collect();
        weighted_choice(&pool, rng).map(|i| &self.options[*i])
    }

    /// Runs the full firing protocol: immediate effects, then the
    /// AI-picked option's effects.
    pub fn fire(&self, scope: &mut S, ctx: &mut Context, rng: &mut impl Rng) {
        self.immediate_effects.apply(scope, ctx);
        if let Some(option) = self.pick_option(rng) {
            option.effects.apply(scope, ctx);
        }
    }
}

/// Exclusive owner of every loaded event.
pub struct EventDatabase<S> {
    events: Vec<Event<S>>,
}

impl<S> Default for EventDatabase<S> {
    fn default() -> Self {
        EventDatabase { events: Vec::new() }
    }
}

impl<S: 'static> EventDatabase<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: Event<S>) -> EventId {
        self.events.push(event);
        EventId(self.events.len() - 1)
    }

    pub fn get(&self, id: EventId) -> &Event<S> {
        &self.events[id.0]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventId, &Event<S>)> {
        self.events.iter().enumerate().map(|(i, e)| (EventId(i), e))
    }

    /// Loads every top-level block of a parsed document as an event and
    /// files it under its trigger. Fails on the first bad event, leaving
    /// nothing half-loaded from that document visible to `check()`.
    pub fn load_document(
        &mut self,
        root: &Block,
        conditions: &ConditionRegistry<S>,
        effects: &EffectRegistry<S>,
        triggers: &mut TriggerRegistry,
    ) -> Result<Vec<EventId>, ScriptError> {
        // Build the whole document before anything lands in the database:
        // a bad event aborts its document without leaving partial entries.
        let mut built = Vec::new();
        for child in &root.children {
            let event = Event::from_block(child, conditions, effects)?;
            if !triggers.is_registered(&event.trigger) {
                return Err(ScriptError::validation(
                    &event.id,
                    format!("unknown trigger `{}`", event.trigger),
                ));
            }
            built.push(event);
        }
        let mut loaded = Vec::new();
        for event in built {
            let id = self.add(event);
            triggers.register_event(self.get(id), id)?;
            loaded.push(id);
        }
        log::info!("Loaded {} events", loaded.len());
        Ok(loaded)
    }

    /// Runs `check()` over every event (startup validation). The first
    /// failure aborts, naming the offending event.
    pub fn check_all(&self, triggers: &TriggerRegistry) -> Result<(), ScriptError> {
        for event in &self.events {
            event.check(triggers)?;
        }
        Ok(())
    }
}

/// Per-trigger event lists.
#[derive(Debug, Clone, Default)]
pub struct EventTrigger {
    /// Fired deterministically, in registration order.
    pub events: Vec<EventId>,
    /// Candidates for weighted random firing.
    pub random_events: Vec<EventId>,
    /// Extra "no event fires" mass in the random pool.
    pub none_weight: i64,
}

/// Identifier-keyed registry of triggers.
///
/// Trigger names are registered once per load cycle and are immutable
/// thereafter; event lists are write-once during load and read-many during
/// simulation. `clear()` resets the lists (keeping the registered names)
/// and may only run between simulation runs.
#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    triggers: FxHashMap<String, EventTrigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a trigger name. Idempotent.
    pub fn register(&mut self, name: impl Into<String>) {
        self.triggers.entry(name.into()).or_default();
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.triggers.contains_key(name)
    }

    /// The trigger's event lists; `None` for an unknown name (firing
    /// treats that as "no events", not an error).
    pub fn get(&self, name: &str) -> Option<&EventTrigger> {
        self.triggers.get(name)
    }

    /// Registers extra no-event mass for the trigger's random pool.
    pub fn set_none_weight(&mut self, name: &str, weight: i64) -> Result<(), ScriptError> {
        match self.triggers.get_mut(name) {
            Some(trigger) => {
                trigger.none_weight = weight;
                Ok(())
            }
            None => Err(ScriptError::NotFound {
                identifier: name.to_string(),
            }),
        }
    }

    /// Files `id` under the event's trigger. A reference to an
    /// unregistered trigger is fatal at load time.
    pub fn register_event<S: 'static>(
        &mut self,
        event: &Event<S>,
        id: EventId,
    ) -> Result<(), ScriptError> {
        let trigger = self.triggers.get_mut(&event.trigger).ok_or_else(|| {
            ScriptError::validation(
                &event.id,
                format!("unknown trigger `{}`", event.trigger),
            )
        })?;
        if event.is_random() {
            trigger.random_events.push(id);
        } else {
            trigger.events.push(id);
        }
        Ok(())
    }

    /// Empties every trigger's event lists for a reload. Must only be
    /// called between simulation runs.
    pub fn clear(&mut self) {
        for trigger in self.triggers.values_mut() {
            trigger.events.clear();
            trigger.random_events.clear();
            trigger.none_weight = 0;
        }
    }
}

/// Cumulative-weight draw over `(item, weight)` pairs.
///
/// Weights that are zero or negative mark ineligible entries; they are
/// excluded from the pool rather than treated as an error. Returns `None`
/// when nothing is eligible.
pub fn weighted_choice<'a, T>(pool: &'a [(T, i64)], rng: &mut impl Rng) -> Option<&'a T> {
    let total: i64 = pool.iter().map(|(_, w)| (*w).max(0)).sum();
    if total <= 0 {
        return None;
    }
    let mut draw = rng.gen_range(0..total);
    for (item, weight) in pool {
        if *weight <= 0 {
            continue;
        }
        if draw < *weight {
            return Some(item);
        }
        draw -= *weight;
    }
    unreachable!("cumulative weights exhausted before the draw")
}

/// Fires every deterministic event of `trigger` whose conditions hold,
/// in registration order. Returns the events that fired.
pub fn fire_trigger<S: 'static>(
    db: &EventDatabase<S>,
    registry: &TriggerRegistry,
    trigger: &str,
    scope: &mut S,
    ctx: &mut Context,
    rng: &mut impl Rng,
) -> Vec<EventId> {
    let ids = match registry.get(trigger) {
        Some(t) => t.events.clone(),
        None => return Vec::new(),
    };
    let mut fired = Vec::new();
    for id in ids {
        let event = db.get(id);
        if !event.conditions_hold(scope) {
            continue;
        }
        event.fire(scope, ctx, rng);
        fired.push(id);
    }
    fired
}

/// Picks at most one random event for `trigger` by weighted draw.
///
/// Candidates contribute their random-weight factor score; the trigger's
/// configured none-weight joins the pool as a "nothing fires" entry.
/// `None` means no event fires this cycle.
pub fn pick_random_event<S: 'static>(
    db: &EventDatabase<S>,
    registry: &TriggerRegistry,
    trigger: &str,
    scope: &S,
    rng: &mut impl Rng,
) -> Option<EventId> {
    let entry = registry.get(trigger)?;
    let mut pool: Vec<(Option<EventId>, i64)> = Vec::new();
    for &id in &entry.random_events {
        let event = db.get(id);
        if !event.conditions_hold(scope) {
            continue;
        }
        let weight = event.random_weight(scope).raw();
        if weight > 0 {
            pool.push((Some(id), weight));
        }
    }
    if entry.none_weight > 0 {
        pool.push((None, Fixed::from_int(entry.none_weight).raw()));
    }
    weighted_choice(&pool, rng).copied().flatten()
}
