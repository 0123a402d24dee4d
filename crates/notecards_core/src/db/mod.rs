//! SQLite bootstrap for the slot store.
//!
//! # Responsibility
//! - Open configured connections whose `slots` table is ready for use.
//! - Track the schema revision so older binaries refuse newer files.
//!
//! # Invariants
//! - The schema revision lives in `PRAGMA user_version`.
//! - No slot is read or written through a connection that skipped migration.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap failures.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// A connection handed in from outside lacks a table the store needs.
    MissingTable(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "slot database is at schema {found}; this build reads up to {supported}"
            ),
            Self::MissingTable(table) => write!(f, "table `{table}` not found; run migrations first"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Returns whether `conn` has a table named `table`.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table],
        |row| row.get(0),
    )?;
    Ok(found)
}
