//! Note domain model.
//!
//! # Responsibility
//! - Define the immutable note record persisted in the durable mirror.
//! - Validate note invariants for creation and decode paths.
//! - Derive list previews from note content.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `content` is never the empty string.
//! - `created_at` is set once at creation and never changes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier of one note.
pub type NoteId = Uuid;

/// Immutable user-authored text record.
///
/// Fields are private and there is no public deserializer: notes are only
/// minted by the note store and by the mirror decoder, both through
/// [`Note::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: NoteId,
    /// Unix epoch milliseconds.
    created_at: i64,
    content: String,
}

/// Validation errors for note invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyContent(NoteId),
    NegativeCreatedAt { id: NoteId, created_at: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent(id) => write!(f, "note {id} has empty content"),
            Self::NegativeCreatedAt { id, created_at } => {
                write!(f, "note {id} has negative created_at {created_at}")
            }
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    pub(crate) fn new(
        id: NoteId,
        created_at: i64,
        content: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        let note = Self {
            id,
            created_at,
            content: content.into(),
        };
        note.validate()?;
        Ok(note)
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    /// Creation time in Unix epoch milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks note invariants.
    ///
    /// Only the exact empty string counts as empty; whitespace-only content is
    /// a valid note body.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.content.is_empty() {
            return Err(NoteValidationError::EmptyContent(self.id));
        }
        if self.created_at < 0 {
            return Err(NoteValidationError::NegativeCreatedAt {
                id: self.id,
                created_at: self.created_at,
            });
        }
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds, clamped at zero.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Derives a single-line preview for list rendering.
///
/// Whitespace runs collapse to one space, the result is trimmed and cut to
/// `max_chars` characters. Returns `None` when nothing printable remains.
pub fn derive_preview_text(content: &str, max_chars: usize) -> Option<String> {
    let normalized = WHITESPACE_RE.replace_all(content, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() || max_chars == 0 {
        return None;
    }
    let mut preview = trimmed.chars().take(max_chars).collect::<String>();
    if trimmed.chars().count() > max_chars {
        preview.push_str("...");
    }
    Some(preview)
}
