//! Area-of-interest records: plain keyed CRUD, independent of the
//! prediction pipeline.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::AoiRecord;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS aoi (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        polygon_wkt TEXT NOT NULL,
        inside      INTEGER NOT NULL DEFAULT 0
    );
";

pub struct AoiStore {
    conn: Mutex<Connection>,
}

impl AoiStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        Self::with_conn(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_conn(Connection::open_in_memory()?)
    }

    fn with_conn(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a record with a generated id. `inside` starts false; nothing
    /// in this service ever updates it.
    pub fn create(&self, name: &str, polygon_wkt: &str) -> Result<AoiRecord> {
        let record = AoiRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            polygon_wkt: polygon_wkt.to_string(),
            inside: false,
        };
        self.conn.lock().execute(
            "INSERT INTO aoi (id, name, polygon_wkt, inside) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.name, record.polygon_wkt, record.inside as i32],
        )?;
        Ok(record)
    }

    /// Every record, in creation order.
    pub fn list_all(&self) -> Result<Vec<AoiRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT id, name, polygon_wkt, inside FROM aoi ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(AoiRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                polygon_wkt: row.get(2)?,
                inside: row.get::<_, i32>(3)? != 0,
            })
        })?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// The record's `inside` flag; unknown ids fail with
    /// [`Error::AoiNotFound`].
    pub fn is_inside(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let inside = conn
            .query_row("SELECT inside FROM aoi WHERE id = ?1", params![id], |row| {
                row.get::<_, i32>(0)
            })
            .optional()?;
        match inside {
            Some(flag) => Ok(flag != 0),
            None => Err(Error::AoiNotFound { id: id.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_generates_id_and_defaults_inside_false() {
        let store = AoiStore::open_in_memory().unwrap();
        let record = store.create("harbor", "POLYGON((0 0, 1 0, 1 1, 0 0))").unwrap();
        assert!(!record.id.is_empty());
        assert!(!record.inside);
        assert_eq!(record.name, "harbor");
    }

    #[test]
    fn list_all_returns_records_in_creation_order() {
        let store = AoiStore::open_in_memory().unwrap();
        let a = store.create("a", "POLYGON((0 0, 1 0, 1 1, 0 0))").unwrap();
        let b = store.create("b", "POLYGON((2 2, 3 2, 3 3, 2 2))").unwrap();
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[1].id, b.id);
    }

    #[test]
    fn is_inside_reads_the_stored_flag() {
        let store = AoiStore::open_in_memory().unwrap();
        let record = store.create("zone", "POLYGON((0 0, 1 0, 1 1, 0 0))").unwrap();
        assert!(!store.is_inside(&record.id).unwrap());
    }

    #[test]
    fn unknown_id_is_aoi_not_found() {
        let store = AoiStore::open_in_memory().unwrap();
        let err = store.is_inside("no-such-id").unwrap_err();
        assert!(matches!(err, Error::AoiNotFound { .. }));
    }
}
