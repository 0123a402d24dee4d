//! SQLite slot backend.
//!
//! # Responsibility
//! - Persist one named slot as a row of the `slots` table.
//! - Replace the slot payload atomically on every write.
//!
//! # Invariants
//! - The wrapped connection has the `slots` table (checked on construction).
//! - Writes are upserts; a slot never has more than one row.

use crate::db::{open_db, open_db_in_memory, table_exists, DbError};
use crate::mirror::{normalize_slot_name, DurableMirror, MirrorResult};
use crate::model::note::now_epoch_ms;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Instant;

/// Slot stored in a migrated SQLite database.
pub struct SqliteMirror {
    conn: Connection,
    slot: String,
}

impl SqliteMirror {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, slot: &str) -> MirrorResult<Self> {
        let conn = open_db(path)?;
        Self::with_connection(conn, slot)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory(slot: &str) -> MirrorResult<Self> {
        let conn = open_db_in_memory()?;
        Self::with_connection(conn, slot)
    }

    /// Wraps an already migrated connection.
    pub fn with_connection(conn: Connection, slot: &str) -> MirrorResult<Self> {
        let slot = normalize_slot_name(slot)?;
        if !table_exists(&conn, "slots")? {
            return Err(DbError::MissingTable("slots").into());
        }
        Ok(Self { conn, slot })
    }

    /// Underlying connection, for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl DurableMirror for SqliteMirror {
    fn slot(&self) -> &str {
        &self.slot
    }

    fn read_slot(&self) -> MirrorResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1;",
                [self.slot.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&mut self, payload: &str) -> MirrorResult<()> {
        let started_at = Instant::now();
        let result = self.conn.execute(
            "INSERT INTO slots (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.slot.as_str(), payload, now_epoch_ms()],
        );

        match result {
            Ok(_) => {
                info!(
                    "event=mirror_write module=mirror status=ok backend=sqlite slot={} bytes={} duration_ms={}",
                    self.slot,
                    payload.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=mirror_write module=mirror status=error backend=sqlite slot={} bytes={} error={}",
                    self.slot,
                    payload.len(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteMirror;
    use crate::db::DbError;
    use crate::mirror::{DurableMirror, MirrorError};
    use rusqlite::Connection;

    #[test]
    fn write_then_read_returns_latest_payload() {
        let mut mirror = SqliteMirror::open_in_memory("notes").unwrap();
        assert_eq!(mirror.read_slot().unwrap(), None);

        mirror.write_slot("[1]").unwrap();
        mirror.write_slot("[2]").unwrap();
        assert_eq!(mirror.read_slot().unwrap().as_deref(), Some("[2]"));

        let rows: i64 = mirror
            .connection()
            .query_row("SELECT COUNT(*) FROM slots;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn slots_are_isolated_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notecards.db");
        let mut first = SqliteMirror::open(&path, "first").unwrap();
        let mut second = SqliteMirror::open(&path, "second").unwrap();

        first.write_slot("[\"a\"]").unwrap();
        assert_eq!(second.read_slot().unwrap(), None);
        second.write_slot("[\"b\"]").unwrap();
        assert_eq!(first.read_slot().unwrap().as_deref(), Some("[\"a\"]"));
    }

    #[test]
    fn unmigrated_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteMirror::with_connection(conn, "notes")
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(err, MirrorError::Db(DbError::MissingTable("slots"))));
    }

    #[test]
    fn invalid_slot_name_is_rejected() {
        let err = SqliteMirror::open_in_memory("bad slot")
            .err()
            .expect("invalid slot must fail");
        assert!(matches!(err, MirrorError::InvalidSlot(_)));
    }
}
