//! Outbound actions.

use crate::TimerId;
use lockmesh_messages::NodeMessage;
use lockmesh_types::{Commit, PeerId};

/// All possible outputs from a lockmesh state machine.
///
/// The runner executes these; the machine itself performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Broadcast a protocol message to every connected peer.
    Broadcast {
        /// The message to broadcast.
        message: NodeMessage,
    },

    /// Send a protocol message to one peer.
    Send {
        /// The recipient.
        to: PeerId,
        /// The message to send.
        message: NodeMessage,
    },

    /// A tick satisfied its barrier and committed. The node consumes this
    /// through its commit pipeline; runners that drive a bare ordering
    /// machine observe it directly.
    CommitReady {
        /// The committed tick.
        commit: Commit,
    },

    /// Arm a timer; the runner delivers `Event::TimerFired` when it elapses.
    /// Re-arming an already armed timer resets it.
    StartTimer {
        /// Timer identity.
        timer: TimerId,
        /// Delay in milliseconds.
        after_ms: i64,
    },

    /// Disarm a previously started timer. Disarming an unknown timer is a
    /// no-op.
    CancelTimer {
        /// Timer identity.
        timer: TimerId,
    },
}

impl Action {
    /// Human-readable name of this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Broadcast { .. } => "Broadcast",
            Action::Send { .. } => "Send",
            Action::CommitReady { .. } => "CommitReady",
            Action::StartTimer { .. } => "StartTimer",
            Action::CancelTimer { .. } => "CancelTimer",
        }
    }

    /// Whether this action reaches the network.
    pub fn is_network(&self) -> bool {
        matches!(self, Action::Broadcast { .. } | Action::Send { .. })
    }
}
