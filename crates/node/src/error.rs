//! Node errors.

use crate::TransportError;
use lockmesh_journal::JournalError;
use thiserror::Error;

/// Errors from the node runtime.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The transport failed to start or stop.
    #[error("transport error")]
    Transport(#[from] TransportError),

    /// The journal failed during recovery.
    #[error("journal error")]
    Journal(#[from] JournalError),

    /// The runtime has shut down and no longer accepts commands.
    #[error("node stopped")]
    Stopped,
}
