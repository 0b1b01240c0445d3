//! Durable per-object trajectory history: a keyed, insertion-ordered list
//! capped at `WINDOW_SIZE` entries.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::types::{TrajectoryPoint, WINDOW_SIZE};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS trajectory_entries (
        key     TEXT NOT NULL,
        payload TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_trajectory_key ON trajectory_entries (key);
";

/// Storage key for one object's history list.
fn key(object_id: &str) -> String {
    format!("trajectory:{object_id}")
}

/// SQLite-backed keyed list store. Rowid is the insertion sequence: the head
/// of a history is the row with the largest rowid under its key.
pub struct TrajectoryStore {
    conn: Mutex<Connection>,
}

impl TrajectoryStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        Self::with_conn(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::with_conn(Connection::open_in_memory()?)
    }

    fn with_conn(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Push `point` at the head of the object's history, then cap the list
    /// at `WINDOW_SIZE` entries by insertion order.
    ///
    /// Push and cap run in one transaction, so concurrent appends for the
    /// same object cannot observe or produce a history longer than
    /// `WINDOW_SIZE`.
    pub fn append(&self, object_id: &str, point: &TrajectoryPoint) -> Result<()> {
        let payload = serde_json::to_string(point).map_err(|e| Error::Serialization {
            reason: e.to_string(),
        })?;
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO trajectory_entries (key, payload) VALUES (?1, ?2)",
            params![key(object_id), payload],
        )?;
        tx.execute(
            "DELETE FROM trajectory_entries
             WHERE key = ?1 AND rowid NOT IN (
                 SELECT rowid FROM trajectory_entries
                 WHERE key = ?1 ORDER BY rowid DESC LIMIT ?2
             )",
            params![key(object_id), WINDOW_SIZE as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// The object's stored history, newest insertion first (not sorted by
    /// timestamp). An unknown object reads as empty, never as an error.
    ///
    /// A malformed stored encoding fails the whole read with
    /// [`Error::Serialization`].
    pub fn window(&self, object_id: &str) -> Result<Vec<TrajectoryPoint>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT payload FROM trajectory_entries
             WHERE key = ?1 ORDER BY rowid DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![key(object_id), WINDOW_SIZE as i64], |row| {
            row.get::<_, String>(0)
        })?;
        let mut points = Vec::with_capacity(WINDOW_SIZE);
        for raw in rows {
            let raw = raw?;
            let point = serde_json::from_str(&raw).map_err(|e| Error::Serialization {
                reason: e.to_string(),
            })?;
            points.push(point);
        }
        Ok(points)
    }
}
