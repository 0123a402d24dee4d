//! Durable mirror contracts and slot-store backends.
//!
//! # Responsibility
//! - Define the single-named-slot persistence contract used by the note store.
//! - Provide SQLite-backed and in-process slot implementations.
//! - Own the wire format of the persisted note list.
//!
//! # Invariants
//! - A slot holds one whole document; writes replace it wholesale.
//! - Slot names are validated before a backend is constructed.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
pub mod memory;
pub mod sqlite;

/// Slot name used when no configuration overrides it.
pub const DEFAULT_SLOT: &str = "notes";

const SLOT_NAME_MAX_CHARS: usize = 64;

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Durable mirror failures.
#[derive(Debug)]
pub enum MirrorError {
    Db(DbError),
    Encode(serde_json::Error),
    /// Payload does not fit the remaining slot quota.
    QuotaExceeded {
        slot: String,
        needed: usize,
        quota: usize,
    },
    InvalidSlot(String),
    /// The slot could not be read, so overwriting it could destroy notes.
    SlotUnreadable { slot: String },
}

impl Display for MirrorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode notes: {err}"),
            Self::QuotaExceeded {
                slot,
                needed,
                quota,
            } => write!(
                f,
                "slot `{slot}` quota exceeded: {needed} bytes needed, {quota} allowed"
            ),
            Self::InvalidSlot(value) => write!(f, "invalid slot name: `{value}`"),
            Self::SlotUnreadable { slot } => {
                write!(f, "slot `{slot}` is unreadable; refusing to overwrite it")
            }
        }
    }
}

impl Error for MirrorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::QuotaExceeded { .. }
            | Self::InvalidSlot(_)
            | Self::SlotUnreadable { .. } => None,
        }
    }
}

impl From<DbError> for MirrorError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for MirrorError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Single named slot holding the serialized note list.
pub trait DurableMirror {
    /// Slot name, used for diagnostics.
    fn slot(&self) -> &str;
    /// Reads the slot payload. `Ok(None)` means the slot was never written.
    fn read_slot(&self) -> MirrorResult<Option<String>>;
    /// Replaces the slot payload.
    fn write_slot(&mut self, payload: &str) -> MirrorResult<()>;
}

/// Normalizes one slot name.
///
/// Accepted names are 1..=64 ASCII characters from `[A-Za-z0-9._-]`, after
/// trimming surrounding whitespace.
pub fn normalize_slot_name(value: &str) -> MirrorResult<String> {
    let trimmed = value.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= SLOT_NAME_MAX_CHARS
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(MirrorError::InvalidSlot(value.to_string()))
    }
}
