//! SQLite-backed durable journal.

use crate::{CommitJournal, JournalError};
use lockmesh_types::{Commit, Height};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Durable journal keyed by height, one row per commit, JSON body.
///
/// The full [`Commit`] is the value; `tick` is denormalized into its own
/// column for inspection with ordinary SQL tooling.
#[derive(Debug)]
pub struct SqliteJournal {
    conn: Connection,
}

impl SqliteJournal {
    /// Open (or create) a journal at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open a throwaway in-memory journal. Durability aside, behaves
    /// identically to a file-backed one.
    pub fn open_in_memory() -> Result<Self, JournalError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), JournalError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS commits (
                height INTEGER PRIMARY KEY,
                tick INTEGER NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl CommitJournal for SqliteJournal {
    fn append(&mut self, commit: &Commit) -> Result<(), JournalError> {
        let expected = self.latest_height()?.next();
        if commit.height != expected {
            return Err(JournalError::HeightMismatch {
                expected,
                got: commit.height,
            });
        }

        let body = serde_json::to_string(commit)?;
        self.conn.execute(
            "INSERT INTO commits (height, tick, body) VALUES (?1, ?2, ?3)",
            params![commit.height.0, commit.tick.0, body],
        )?;
        debug!(height = %commit.height, tick = %commit.tick, "Commit persisted");
        Ok(())
    }

    fn get_range(&self, from: Height, to: Height) -> Result<Vec<Commit>, JournalError> {
        if from.0 == 0 || from > to {
            return Ok(vec![]);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM commits WHERE height BETWEEN ?1 AND ?2 ORDER BY height")?;
        let rows = stmt.query_map(params![from.0, to.0], |row| row.get::<_, String>(0))?;

        let mut commits = Vec::new();
        for body in rows {
            commits.push(serde_json::from_str(&body?)?);
        }
        Ok(commits)
    }

    fn latest_height(&self) -> Result<Height, JournalError> {
        let max: Option<u64> = self
            .conn
            .query_row("SELECT MAX(height) FROM commits", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(Height(max.unwrap_or(0)))
    }

    fn clear(&mut self) -> Result<(), JournalError> {
        self.conn.execute("DELETE FROM commits", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockmesh_types::{PeerId, SignedAction, Tick};

    fn commit(height: u64) -> Commit {
        Commit {
            height: Height(height),
            tick: Tick(height as i64 + 10),
            actions: vec![SignedAction {
                peer: PeerId::from("A"),
                seq: 0,
                payload: serde_json::json!({"n": height}),
            }],
        }
    }

    #[test]
    fn append_and_read_back() {
        let mut journal = SqliteJournal::open_in_memory().unwrap();
        journal.append(&commit(1)).unwrap();
        journal.append(&commit(2)).unwrap();

        let range = journal.get_range(Height(1), Height(2)).unwrap();
        assert_eq!(range, vec![commit(1), commit(2)]);
        assert_eq!(journal.latest_height().unwrap(), Height(2));
    }

    #[test]
    fn height_mismatch_rejected() {
        let mut journal = SqliteJournal::open_in_memory().unwrap();
        journal.append(&commit(1)).unwrap();
        assert!(matches!(
            journal.append(&commit(3)),
            Err(JournalError::HeightMismatch {
                expected: Height(2),
                got: Height(3),
            })
        ));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("journal.db");

        {
            let mut journal = SqliteJournal::open(&path).unwrap();
            journal.append(&commit(1)).unwrap();
            journal.append(&commit(2)).unwrap();
        }

        let mut journal = SqliteJournal::open(&path).unwrap();
        assert_eq!(journal.latest_height().unwrap(), Height(2));
        assert_eq!(
            journal.get_range(Height(2), Height(2)).unwrap(),
            vec![commit(2)]
        );

        // Appends continue where the previous process stopped.
        journal.append(&commit(3)).unwrap();
        assert_eq!(journal.latest_height().unwrap(), Height(3));
    }

    #[test]
    fn clear_drops_everything() {
        let mut journal = SqliteJournal::open_in_memory().unwrap();
        journal.append(&commit(1)).unwrap();
        journal.clear().unwrap();
        assert_eq!(journal.latest_height().unwrap(), Height::ZERO);
        assert!(journal.get_range(Height(1), Height(1)).unwrap().is_empty());
    }
}
