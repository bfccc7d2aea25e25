//! Protocol identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque peer identifier, unique within a room.
///
/// Identity is assigned by the embedding application (often a public-key
/// hex). The derived `Ord` (lexicographic byte order of the string) is the
/// canonical total order used when flattening a tick's actions into a
/// commit; changing it would break cross-peer determinism.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl PeerId {
    /// Create a peer id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Logical ordering tick, floor-divided from wall time.
///
/// Negative values mean "not started"; [`Tick::UNSTARTED`] is the canonical
/// pre-start sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Tick(pub i64);

impl Tick {
    /// Sentinel for "the clock has not produced a tick yet".
    pub const UNSTARTED: Tick = Tick(-1);

    /// Whether this tick is a real (non-negative) ordering tick.
    pub fn is_started(self) -> bool {
        self.0 >= 0
    }

    /// The following tick.
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }

    /// The preceding tick.
    pub fn prev(self) -> Tick {
        Tick(self.0 - 1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based position in the commit journal. `Height(0)` means "empty".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Height(pub u64);

impl Height {
    /// The height of an empty journal.
    pub const ZERO: Height = Height(0);

    /// The following height.
    pub fn next(self) -> Height {
        Height(self.0 + 1)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
