//! Protocol envelope and message variants.

use crate::WireError;
use lockmesh_types::{Height, PeerId, SignedAction, Tick};
use serde::{Deserialize, Serialize};

/// Transport topic all protocol traffic travels on.
pub const NODE_TOPIC: &str = "node";

/// Envelope version this build speaks.
pub const PROTOCOL_VERSION: &str = "v1";

/// Versioned JSON envelope wrapping every protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version tag.
    pub v: String,
    /// Sender wall time at encode, epoch milliseconds. Informational only.
    pub ts: i64,
    /// The protocol message.
    pub msg: NodeMessage,
}

/// Protocol messages exchanged between peers.
///
/// Every variant carries the room id; messages for other rooms are dropped
/// silently by the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeMessage {
    /// An authored action proposed for a future tick.
    #[serde(rename = "ACTION_PROPOSE", rename_all = "camelCase")]
    ActionPropose {
        /// Room the proposal belongs to.
        room_id: String,
        /// Authoring peer (must equal the transport-level sender).
        peer_id: PeerId,
        /// Target ordering tick.
        tick: Tick,
        /// Per-(tick, author) sequence number.
        seq: i64,
        /// Application payload.
        payload: serde_json::Value,
    },

    /// The author's declaration that a tick is closed for them.
    #[serde(rename = "ACTION_SEAL", rename_all = "camelCase")]
    ActionSeal {
        /// Room the seal belongs to.
        room_id: String,
        /// Sealing peer.
        peer_id: PeerId,
        /// The tick being sealed.
        tick: Tick,
        /// Highest seq the author sent for this tick, or −1 for none.
        last_seq: i64,
    },

    /// Advisory gossip of a locally computed commit. Receivers recompute
    /// commits themselves and ignore the body.
    #[serde(rename = "ACTION_COMMIT", rename_all = "camelCase")]
    ActionCommit {
        /// Room the commit belongs to.
        room_id: String,
        /// The committed ordering tick.
        tick: Tick,
        /// Journal height of the commit.
        height: Height,
        /// The flattened action list.
        actions: Vec<SignedAction>,
    },

    /// Tick-warp hint: the sender's current tick. A receiver that is behind
    /// warps forward.
    #[serde(rename = "SYNC_CLOCK", rename_all = "camelCase")]
    SyncClock {
        /// Room the hint belongs to.
        room_id: String,
        /// The reporting peer.
        peer_id: PeerId,
        /// The sender's current tick.
        tick: Tick,
    },
}

impl NodeMessage {
    /// Human-readable name of this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeMessage::ActionPropose { .. } => "ACTION_PROPOSE",
            NodeMessage::ActionSeal { .. } => "ACTION_SEAL",
            NodeMessage::ActionCommit { .. } => "ACTION_COMMIT",
            NodeMessage::SyncClock { .. } => "SYNC_CLOCK",
        }
    }

    /// The room this message belongs to.
    pub fn room_id(&self) -> &str {
        match self {
            NodeMessage::ActionPropose { room_id, .. }
            | NodeMessage::ActionSeal { room_id, .. }
            | NodeMessage::ActionCommit { room_id, .. }
            | NodeMessage::SyncClock { room_id, .. } => room_id,
        }
    }

    /// The peer named in the message envelope, when the variant carries one.
    pub fn peer_id(&self) -> Option<&PeerId> {
        match self {
            NodeMessage::ActionPropose { peer_id, .. }
            | NodeMessage::ActionSeal { peer_id, .. }
            | NodeMessage::SyncClock { peer_id, .. } => Some(peer_id),
            NodeMessage::ActionCommit { .. } => None,
        }
    }
}

/// Encode a message into envelope JSON bytes.
pub fn encode_envelope(msg: NodeMessage, ts: i64) -> Result<Vec<u8>, WireError> {
    let envelope = Envelope {
        v: PROTOCOL_VERSION.to_string(),
        ts,
        msg,
    };
    serde_json::to_vec(&envelope).map_err(|e| WireError::MalformedFrame(e.to_string()))
}

/// Decode envelope JSON bytes back into the carried message.
pub fn decode_envelope(bytes: &[u8]) -> Result<NodeMessage, WireError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| WireError::MalformedFrame(e.to_string()))?;

    // Check the version before deserializing the message so an unknown
    // version is reported as such, not as a shape mismatch.
    let version = value.get("v").and_then(|v| v.as_str()).unwrap_or("");
    if version != PROTOCOL_VERSION {
        return Err(WireError::UnsupportedVersion(version.to_string()));
    }

    let envelope: Envelope =
        serde_json::from_value(value).map_err(|e| WireError::MalformedFrame(e.to_string()))?;
    Ok(envelope.msg)
}
