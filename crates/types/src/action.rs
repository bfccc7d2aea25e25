//! Action stream types: signed actions, commits, reducer metadata.

use crate::{Height, PeerId, Tick};
use serde::{Deserialize, Serialize};

/// An action as authored by a peer for a specific tick.
///
/// `seq` is assigned by the author, monotonically increasing from 0 within
/// each (tick, author) pair. Ordering within a commit is (author, seq), so
/// the pair is the action's identity for dedup purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAction {
    /// The authoring peer.
    #[serde(rename = "peerId")]
    pub peer: PeerId,

    /// Per-(tick, author) sequence number, starting at 0.
    pub seq: i64,

    /// Application payload, opaque to the ordering core.
    pub payload: serde_json::Value,
}

/// A committed tick: the deterministically ordered set of actions every
/// peer agrees occurred at `tick`.
///
/// `height` is the 1-based, gap-free position in the journal. Both `height`
/// and `tick` increase strictly and without gaps across consecutive commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Journal position, starting at 1.
    pub height: Height,

    /// The ordering tick this commit closes.
    #[serde(rename = "orderingTick")]
    pub tick: Tick,

    /// Flattened actions: eligible peers in lexicographic order, each
    /// peer's actions ascending by seq.
    pub actions: Vec<SignedAction>,
}

/// Metadata handed to the rule kernel and systems alongside each action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMeta {
    /// Authenticated author of the action.
    pub from: PeerId,

    /// Ordering tick the action belongs to.
    pub tick: Tick,

    /// Journal height of the enclosing commit; `None` while applying
    /// optimistically (the action has not committed yet).
    pub height: Option<Height>,
}

/// Metadata for per-tick passes (schedulers).
///
/// Deliberately carries no peer identity: scheduler transitions must be
/// identical on every peer, and the local peer id is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickMeta {
    /// The tick being caught up.
    pub tick: Tick,
}
