//! Membership vocabulary.

use crate::PeerId;
use serde::{Deserialize, Serialize};

/// Role of a participant in the mesh.
///
/// Every lockstep participant is a `Peer`; `Observer` covers read-only
/// attachments (spectators, recorders) that never enter the seal barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    /// Full lockstep participant: proposes, seals, counts toward barriers.
    #[default]
    Peer,
    /// Read-only attachment; receives state but never seals.
    Observer,
}

/// A known participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// The peer's identifier.
    pub id: PeerId,
    /// The peer's role.
    pub role: PeerRole,
}

impl PeerInfo {
    /// A full participant with the default role.
    pub fn peer(id: PeerId) -> Self {
        Self {
            id,
            role: PeerRole::Peer,
        }
    }
}

/// Connectivity change reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A peer joined the mesh.
    Connected {
        /// The connecting peer.
        peer: PeerId,
    },
    /// A peer left the mesh.
    Disconnected {
        /// The departing peer.
        peer: PeerId,
        /// Transport-provided reason, when available.
        reason: Option<String>,
    },
}

impl PeerEvent {
    /// The peer this event concerns.
    pub fn peer(&self) -> &PeerId {
        match self {
            PeerEvent::Connected { peer } => peer,
            PeerEvent::Disconnected { peer, .. } => peer,
        }
    }
}
