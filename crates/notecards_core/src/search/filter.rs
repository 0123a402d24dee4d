//! Case-insensitive substring filter.
//!
//! # Invariants
//! - An empty query is the identity: every note, same order.
//! - A non-empty query keeps input order and matches on
//!   `content.to_lowercase().contains(query.to_lowercase())`.
//! - The query is used verbatim; surrounding whitespace is significant.

use crate::model::note::Note;

/// Returns the notes visible for `query`, borrowed from `notes`.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    if query.is_empty() {
        return notes.iter().collect();
    }

    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| contains_lowercase(note.content(), &needle))
        .collect()
}

/// Returns whether `note` is visible for `query`.
pub fn matches_query(note: &Note, query: &str) -> bool {
    query.is_empty() || contains_lowercase(note.content(), &query.to_lowercase())
}

fn contains_lowercase(content: &str, needle: &str) -> bool {
    content.to_lowercase().contains(needle)
}
