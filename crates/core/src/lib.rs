//! Core event/action model for the lockmesh state machines.
//!
//! This crate provides the vocabulary shared by the ordering layer, the
//! node, and the runners:
//!
//! - [`Event`]: all possible inputs to a state machine
//! - [`Action`]: all possible outputs from a state machine
//! - [`EventPriority`]: ordering priority for events at the same timestamp
//! - [`StateMachine`]: the trait every machine implements
//!
//! # Architecture
//!
//! The protocol core is built on a simple event-driven model:
//!
//! ```text
//! Events → StateMachine::handle() → Actions
//! ```
//!
//! The state machine is:
//! - **Synchronous**: no async, no `.await`
//! - **Deterministic**: same state + event = same actions
//! - **Pure-ish**: mutates self, but performs no I/O
//!
//! All I/O is handled by the runner (deterministic simulation or the tokio
//! node runtime) which:
//! 1. Delivers events to the state machine
//! 2. Executes the returned actions (network sends, timers)
//! 3. Converts externally observed results back into events

mod action;
mod event;
mod traits;

pub use action::Action;
pub use event::{Event, EventPriority};
pub use traits::StateMachine;

use lockmesh_types::PeerId;

/// Type for timer identification.
///
/// Timers are requested via [`Action::StartTimer`] and come back as
/// [`Event::TimerFired`]; the runner owns the actual clocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Settle delay before sending a `SYNC_CLOCK` hint to a freshly
    /// connected peer.
    ClockSync {
        /// The peer awaiting the hint.
        peer: PeerId,
    },
}
