//! Append-only gap-free commit journal.
//!
//! The journal is the durable record a node recovers and replays from. Its
//! single invariant: consecutive appends carry consecutive heights starting
//! at 1. An append that would break the sequence fails with
//! [`JournalError::HeightMismatch`], which the node treats as fatal — the
//! commit pipeline halts rather than persist a gap.
//!
//! Two implementations:
//!
//! - [`MemoryJournal`]: volatile, for small rooms and tests
//! - [`SqliteJournal`]: durable, keyed by height, survives restart

mod error;
mod memory;
mod sqlite;

pub use error::JournalError;
pub use memory::MemoryJournal;
pub use sqlite::SqliteJournal;

use lockmesh_types::{Commit, Height};

/// The commit log contract.
pub trait CommitJournal: Send {
    /// Append the next commit. Fails with [`JournalError::HeightMismatch`]
    /// unless `commit.height` is exactly `latest_height() + 1`.
    fn append(&mut self, commit: &Commit) -> Result<(), JournalError>;

    /// Inclusive range read. Returns the contiguous slice
    /// `[from, min(to, latest)]`, or empty when the range misses the log.
    fn get_range(&self, from: Height, to: Height) -> Result<Vec<Commit>, JournalError>;

    /// Current maximum height; [`Height::ZERO`] when empty.
    fn latest_height(&self) -> Result<Height, JournalError>;

    /// Drop all commits.
    fn clear(&mut self) -> Result<(), JournalError>;
}
