//! In-memory journal.

use crate::{CommitJournal, JournalError};
use lockmesh_types::{Commit, Height};

/// Volatile journal backed by a `Vec`. Height `h` lives at index `h − 1`.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    commits: Vec<Commit>,
}

impl MemoryJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommitJournal for MemoryJournal {
    fn append(&mut self, commit: &Commit) -> Result<(), JournalError> {
        let expected = Height(self.commits.len() as u64 + 1);
        if commit.height != expected {
            return Err(JournalError::HeightMismatch {
                expected,
                got: commit.height,
            });
        }
        self.commits.push(commit.clone());
        Ok(())
    }

    fn get_range(&self, from: Height, to: Height) -> Result<Vec<Commit>, JournalError> {
        if from.0 == 0 || from > to || self.commits.is_empty() {
            return Ok(vec![]);
        }
        let latest = self.commits.len() as u64;
        if from.0 > latest {
            return Ok(vec![]);
        }
        let end = to.0.min(latest);
        Ok(self.commits[(from.0 - 1) as usize..end as usize].to_vec())
    }

    fn latest_height(&self) -> Result<Height, JournalError> {
        Ok(Height(self.commits.len() as u64))
    }

    fn clear(&mut self) -> Result<(), JournalError> {
        self.commits.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockmesh_types::Tick;

    fn commit(height: u64) -> Commit {
        Commit {
            height: Height(height),
            tick: Tick(height as i64),
            actions: vec![],
        }
    }

    #[test]
    fn appends_are_gap_free() {
        let mut journal = MemoryJournal::new();
        assert_eq!(journal.latest_height().unwrap(), Height::ZERO);

        journal.append(&commit(1)).unwrap();
        journal.append(&commit(2)).unwrap();
        assert_eq!(journal.latest_height().unwrap(), Height(2));

        let err = journal.append(&commit(4)).unwrap_err();
        assert!(matches!(
            err,
            JournalError::HeightMismatch {
                expected: Height(3),
                got: Height(4),
            }
        ));
        // The failed append must not advance the log.
        assert_eq!(journal.latest_height().unwrap(), Height(2));
    }

    #[test]
    fn range_reads() {
        let mut journal = MemoryJournal::new();
        for h in 1..=5 {
            journal.append(&commit(h)).unwrap();
        }

        let range = journal.get_range(Height(2), Height(4)).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].height, Height(2));
        assert_eq!(range[2].height, Height(4));

        // Clamped at the top, empty when out of range.
        assert_eq!(journal.get_range(Height(4), Height(99)).unwrap().len(), 2);
        assert!(journal.get_range(Height(6), Height(9)).unwrap().is_empty());
        assert!(journal.get_range(Height(0), Height(3)).unwrap().is_empty());
        assert!(journal.get_range(Height(3), Height(2)).unwrap().is_empty());
    }

    #[test]
    fn clear_resets_heights() {
        let mut journal = MemoryJournal::new();
        journal.append(&commit(1)).unwrap();
        journal.clear().unwrap();
        assert_eq!(journal.latest_height().unwrap(), Height::ZERO);
        journal.append(&commit(1)).unwrap();
    }
}
