//! Deterministic engine runtime: the reducer pipeline consuming committed
//! actions.
//!
//! The pipeline per action is `validate → state transition → system passes`;
//! after each commit the scheduler catch-up runs tick-gated jobs for every
//! tick the commit closed. Everything here is pure with respect to its
//! inputs — no wall clocks, no ambient randomness — so that two peers
//! reducing the same commit stream produce byte-identical state.
//!
//! Capability seams:
//!
//! - [`Rule`]: cheap validation + the state transition itself
//! - [`System`]: post-apply pass, run in registration order
//! - [`Scheduler`]: tick-gated job described by a [`Schedule`]
//! - [`View`]: per-viewer projection (fog-of-war and the like)
//!
//! [`Engine`] composes them behind one facade the node drives.

mod engine;
mod rng;
mod rule;
mod scheduler;
mod system;

pub use engine::{Engine, EngineBuilder, EngineError};
pub use rng::DeterministicRng;
pub use rule::{Rule, RuleViolation};
pub use scheduler::{Schedule, Scheduler};
pub use system::{System, View};
