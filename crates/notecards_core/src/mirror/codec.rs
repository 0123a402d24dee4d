//! Wire format for the persisted note list.
//!
//! The slot payload is a JSON array of `{"id","createdAt","content"}`
//! records, newest first. Decoding is record-tolerant: a malformed element is
//! dropped without discarding its neighbours.

use crate::mirror::{MirrorError, MirrorResult};
use crate::model::note::{Note, NoteId};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Persisted shape of one note; only reaches callers through [`Note::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNote {
    id: NoteId,
    created_at: i64,
    content: String,
}

impl StoredNote {
    fn into_note(self) -> Option<Note> {
        Note::new(self.id, self.created_at, self.content).ok()
    }
}

/// Notes recovered from one payload plus the number of discarded records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedNotes {
    pub notes: Vec<Note>,
    /// Records skipped because they were malformed, invalid or duplicated.
    pub dropped: usize,
}

/// Serializes the full note list for one slot write.
pub fn encode_notes(notes: &[Note]) -> MirrorResult<String> {
    serde_json::to_string(notes).map_err(MirrorError::Encode)
}

/// Parses one slot payload.
///
/// Fails only when the payload is not a JSON array. Elements that are not
/// valid notes, or repeat an earlier id, are counted in `dropped`.
pub fn decode_notes(payload: &str) -> Result<DecodedNotes, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(payload)?;
    let mut seen: HashSet<NoteId> = HashSet::with_capacity(records.len());
    let mut decoded = DecodedNotes {
        notes: Vec::with_capacity(records.len()),
        dropped: 0,
    };

    for record in records {
        let note = match serde_json::from_value::<StoredNote>(record)
            .ok()
            .and_then(StoredNote::into_note)
        {
            Some(note) => note,
            None => {
                decoded.dropped += 1;
                continue;
            }
        };
        if !seen.insert(note.id()) {
            decoded.dropped += 1;
            continue;
        }
        decoded.notes.push(note);
    }

    Ok(decoded)
}
