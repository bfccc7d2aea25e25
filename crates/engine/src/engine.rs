//! The engine facade.

use crate::{Rule, RuleViolation, Scheduler, System, View};
use lockmesh_types::{ActionMeta, PeerId, Tick, TickMeta};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Errors from the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A payload could not be decoded into an application action.
    #[error("action decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// An application action could not be encoded for the wire.
    #[error("action encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Composes the rule kernel, systems, schedulers, and view behind the
/// facade the node drives.
///
/// `reduce` never panics on bad input: an illegal action returns the state
/// unchanged with a warn log, because a single peer rejecting what the
/// others applied is exactly the divergence lockstep exists to prevent —
/// rejection must flow from the shared rule, not from local failure.
pub struct Engine<S, A> {
    initial_state: S,
    rule: Box<dyn Rule<S, A> + Send + Sync>,
    systems: Vec<Box<dyn System<S> + Send + Sync>>,
    schedulers: Vec<Box<dyn Scheduler<S> + Send + Sync>>,
    view: Option<Box<dyn View<S> + Send + Sync>>,
}

impl<S: Clone, A> Engine<S, A> {
    /// Start building an engine around a rule kernel.
    pub fn builder(
        initial_state: S,
        rule: impl Rule<S, A> + Send + Sync + 'static,
    ) -> EngineBuilder<S, A> {
        EngineBuilder {
            initial_state,
            rule: Box::new(rule),
            systems: Vec::new(),
            schedulers: Vec::new(),
            view: None,
        }
    }

    /// The state every node starts from.
    pub fn initial_state(&self) -> S {
        self.initial_state.clone()
    }

    /// Delegated validity check.
    pub fn is_legal(&self, state: &S, action: &A, meta: &ActionMeta) -> Result<(), RuleViolation> {
        self.rule.is_legal(state, action, meta)
    }

    /// Validate, apply the rule, then run every system in registration
    /// order. Illegal actions leave the state unchanged.
    pub fn reduce(&self, state: &S, action: &A, meta: &ActionMeta) -> S {
        if let Err(violation) = self.rule.is_legal(state, action, meta) {
            warn!(from = %meta.from, tick = %meta.tick, %violation, "Action rejected by rule");
            return state.clone();
        }

        let mut next = self.rule.apply(state, action, meta);
        for system in &self.systems {
            next = system.update(&next, meta);
        }
        next
    }

    /// Run the scheduler catch-up for every tick in
    /// `(from_exclusive, to_inclusive]`.
    ///
    /// Schedulers execute in id order within each tick; the loop never
    /// skips a tick even when commits arrive in bursts.
    pub fn run_schedulers(&self, state: S, from_exclusive: Tick, to_inclusive: Tick) -> S {
        let mut next = state;
        let mut tick = from_exclusive.next();
        while tick <= to_inclusive {
            let meta = TickMeta { tick };
            for scheduler in &self.schedulers {
                if scheduler.is_due(&next, &meta) {
                    next = scheduler.apply(&next, &meta);
                }
            }
            tick = tick.next();
        }
        next
    }

    /// Project the state for one viewer. Falls back to the full state when
    /// no view is configured.
    pub fn observe(&self, state: &S, viewer: &PeerId) -> serde_json::Value
    where
        S: Serialize,
    {
        match &self.view {
            Some(view) => view.observe(state, viewer),
            None => serde_json::to_value(state).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Decode a wire payload into an application action.
    pub fn decode_action(&self, payload: &serde_json::Value) -> Result<A, EngineError>
    where
        A: DeserializeOwned,
    {
        serde_json::from_value(payload.clone()).map_err(EngineError::Decode)
    }

    /// Encode an application action for the wire.
    pub fn encode_action(&self, action: &A) -> Result<serde_json::Value, EngineError>
    where
        A: Serialize,
    {
        serde_json::to_value(action).map_err(EngineError::Encode)
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder<S, A> {
    initial_state: S,
    rule: Box<dyn Rule<S, A> + Send + Sync>,
    systems: Vec<Box<dyn System<S> + Send + Sync>>,
    schedulers: Vec<Box<dyn Scheduler<S> + Send + Sync>>,
    view: Option<Box<dyn View<S> + Send + Sync>>,
}

impl<S: Clone, A> EngineBuilder<S, A> {
    /// Register a post-apply system. Order of registration is order of
    /// execution.
    pub fn system(mut self, system: impl System<S> + Send + Sync + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Register a tick-gated scheduler.
    pub fn scheduler(mut self, scheduler: impl Scheduler<S> + Send + Sync + 'static) -> Self {
        self.schedulers.push(Box::new(scheduler));
        self
    }

    /// Set the per-viewer projection.
    pub fn view(mut self, view: impl View<S> + Send + Sync + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    /// Finish the engine. Schedulers are sorted by id here so execution
    /// order is stable no matter the registration order.
    pub fn build(mut self) -> Engine<S, A> {
        self.schedulers.sort_by(|a, b| a.id().cmp(b.id()));
        Engine {
            initial_state: self.initial_state,
            rule: self.rule,
            systems: self.systems,
            schedulers: self.schedulers,
            view: self.view,
        }
    }
}
