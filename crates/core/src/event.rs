//! Inbound events.

use crate::TimerId;
use lockmesh_messages::NodeMessage;
use lockmesh_types::PeerId;

/// All possible inputs to a lockmesh state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The driving clock advanced. Carries the injected wall time so tests
    /// can drive time explicitly.
    TickElapsed {
        /// Wall time in epoch milliseconds.
        now_ms: i64,
    },

    /// The local application submitted an action.
    LocalAction {
        /// Encoded application payload.
        payload: serde_json::Value,
        /// Wall time of submission, epoch milliseconds.
        now_ms: i64,
    },

    /// A protocol message arrived from the transport.
    MessageReceived {
        /// Transport-level (authenticated) sender.
        from: PeerId,
        /// The decoded protocol message.
        message: NodeMessage,
    },

    /// A peer joined the mesh.
    PeerConnected {
        /// The connecting peer.
        peer: PeerId,
    },

    /// A peer left the mesh.
    PeerDisconnected {
        /// The departing peer.
        peer: PeerId,
        /// Transport-provided reason, when available.
        reason: Option<String>,
    },

    /// A timer requested via `Action::StartTimer` fired.
    TimerFired {
        /// The fired timer.
        timer: TimerId,
    },
}

impl Event {
    /// Human-readable name of this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::TickElapsed { .. } => "TickElapsed",
            Event::LocalAction { .. } => "LocalAction",
            Event::MessageReceived { .. } => "MessageReceived",
            Event::PeerConnected { .. } => "PeerConnected",
            Event::PeerDisconnected { .. } => "PeerDisconnected",
            Event::TimerFired { .. } => "TimerFired",
        }
    }

    /// Priority of this event relative to others due at the same instant.
    pub fn priority(&self) -> EventPriority {
        match self {
            Event::TickElapsed { .. } | Event::TimerFired { .. } => EventPriority::Clock,
            Event::MessageReceived { .. }
            | Event::PeerConnected { .. }
            | Event::PeerDisconnected { .. } => EventPriority::Network,
            Event::LocalAction { .. } => EventPriority::Local,
        }
    }
}

/// Ordering priority for events due at the same timestamp.
///
/// Deterministic runners process clock events before network events before
/// local submissions when they collide on the same instant, so that a tick
/// boundary observed at time `t` seals before messages stamped `t` land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventPriority {
    /// Tick advancement and timer expirations.
    Clock = 0,
    /// Transport messages and peer connectivity changes.
    Network = 1,
    /// Local application submissions.
    Local = 2,
}
