//! Journal errors.

use lockmesh_types::Height;
use thiserror::Error;

/// Errors from journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// An append would break the gap-free height sequence. Fatal to the
    /// commit pipeline.
    #[error("height mismatch: expected {expected}, got {got}")]
    HeightMismatch {
        /// The height the journal would accept next.
        expected: Height,
        /// The height that was offered.
        got: Height,
    },

    /// The underlying store failed.
    #[error("journal storage error")]
    Storage(#[from] rusqlite::Error),

    /// A stored record could not be encoded or decoded.
    #[error("journal codec error")]
    Codec(#[from] serde_json::Error),
}
