//! Note store implementation over a [`DurableMirror`].

use crate::mirror::codec::{decode_notes, encode_notes};
use crate::mirror::{DurableMirror, MirrorError};
use crate::model::note::{now_epoch_ms, Note, NoteId};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use uuid::Uuid;

/// Result of a store mutation.
///
/// The mutation has always been applied in memory; `write_error` reports
/// whether the mirror rewrite that followed it failed.
#[derive(Debug)]
pub struct StoreWrite<T> {
    pub value: T,
    pub write_error: Option<MirrorError>,
}

impl<T> StoreWrite<T> {
    /// Returns whether the mirror reflects this mutation.
    pub fn is_persisted(&self) -> bool {
        self.write_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Reads the initial note list from `mirror`.
///
/// Fails open: a missing, unreadable or unparsable slot yields an empty list.
/// Individually invalid records are dropped and the rest are kept.
pub fn load_initial<M: DurableMirror + ?Sized>(mirror: &M) -> Vec<Note> {
    read_notes(mirror).unwrap_or_default()
}

/// Like [`load_initial`], but keeps a failed slot read distinct from an empty
/// or corrupt slot. Only the former is an error.
fn read_notes<M: DurableMirror + ?Sized>(mirror: &M) -> Result<Vec<Note>, MirrorError> {
    let payload = match mirror.read_slot() {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            info!(
                "event=store_load module=store status=empty slot={}",
                mirror.slot()
            );
            return Ok(Vec::new());
        }
        Err(err) => {
            warn!(
                "event=store_load module=store status=fail_open slot={} error_code=mirror_read_failed error={}",
                mirror.slot(),
                err
            );
            return Err(err);
        }
    };

    match decode_notes(&payload) {
        Ok(decoded) => {
            if decoded.dropped > 0 {
                warn!(
                    "event=store_load module=store status=partial slot={} note_count={} dropped={}",
                    mirror.slot(),
                    decoded.notes.len(),
                    decoded.dropped
                );
            } else {
                info!(
                    "event=store_load module=store status=ok slot={} note_count={}",
                    mirror.slot(),
                    decoded.notes.len()
                );
            }
            Ok(decoded.notes)
        }
        Err(err) => {
            warn!(
                "event=store_load module=store status=fail_open slot={} bytes={} error_code=mirror_decode_failed error={}",
                mirror.slot(),
                payload.len(),
                err
            );
            Ok(Vec::new())
        }
    }
}

/// Canonical owner of the note list and its durable mirror.
///
/// When the slot cannot be read at open, the store starts empty but never
/// overwrites the slot until a later read succeeds; see [`NoteStore::recover`].
pub struct NoteStore<M: DurableMirror> {
    mirror: M,
    notes: Vec<Note>,
    slot_readable: bool,
}

impl<M: DurableMirror> NoteStore<M> {
    /// Opens the store, loading whatever the mirror currently holds.
    pub fn open(mirror: M) -> Self {
        let (notes, slot_readable) = match read_notes(&mirror) {
            Ok(notes) => (notes, true),
            Err(_) => (Vec::new(), false),
        };
        Self {
            mirror,
            notes,
            slot_readable,
        }
    }

    /// Full list, newest first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether the slot has been read successfully since open.
    pub fn is_slot_readable(&self) -> bool {
        self.slot_readable
    }

    /// Retries a slot read that failed at open.
    ///
    /// On success the stored notes are appended after the notes created since
    /// open, and any such notes are written back. Returns whether the slot is
    /// now readable.
    pub fn recover(&mut self) -> bool {
        if self.slot_readable {
            return true;
        }
        let pending = !self.notes.is_empty();
        if !self.reload_unreadable() {
            return false;
        }
        if pending {
            self.persist();
        }
        true
    }

    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    pub fn into_mirror(self) -> M {
        self.mirror
    }

    /// Creates one note from `content` and prepends it.
    ///
    /// Returns `None` without touching the list or the mirror when `content`
    /// is empty.
    pub fn create(&mut self, content: impl Into<String>) -> Option<StoreWrite<Note>> {
        let content = content.into();
        if content.is_empty() {
            debug!("event=note_create module=store status=skipped reason=empty_content");
            return None;
        }

        let note = match Note::new(self.fresh_id(), now_epoch_ms(), content) {
            Ok(note) => note,
            Err(err) => {
                error!("event=note_create module=store status=error error={err}");
                return None;
            }
        };
        self.notes.insert(0, note.clone());
        let write_error = self.persist();
        info!(
            "event=note_create module=store status=ok note_id={} note_count={} persisted={}",
            note.id(),
            self.notes.len(),
            write_error.is_none()
        );

        Some(StoreWrite {
            value: note,
            write_error,
        })
    }

    /// Removes the note with `id` and returns the resulting list.
    ///
    /// Deleting an unknown id is a no-op: the list is returned unchanged and
    /// the mirror is not rewritten.
    pub fn delete(&mut self, id: NoteId) -> StoreWrite<Vec<Note>> {
        let Some(index) = self.notes.iter().position(|note| note.id() == id) else {
            debug!("event=note_delete module=store status=skipped reason=not_found note_id={id}");
            return StoreWrite {
                value: self.notes.clone(),
                write_error: None,
            };
        };

        self.notes.remove(index);
        let write_error = self.persist();
        info!(
            "event=note_delete module=store status=ok note_id={} note_count={} persisted={}",
            id,
            self.notes.len(),
            write_error.is_none()
        );

        StoreWrite {
            value: self.notes.clone(),
            write_error,
        }
    }

    fn fresh_id(&self) -> NoteId {
        loop {
            let candidate = Uuid::new_v4();
            if self.get(candidate).is_none() {
                return candidate;
            }
        }
    }

    fn reload_unreadable(&mut self) -> bool {
        let Ok(stored) = read_notes(&self.mirror) else {
            return false;
        };
        let session_ids: HashSet<NoteId> = self.notes.iter().map(Note::id).collect();
        let stored_count = stored.len();
        self.notes
            .extend(stored.into_iter().filter(|note| !session_ids.contains(&note.id())));
        self.slot_readable = true;
        info!(
            "event=store_recover module=store status=ok slot={} stored_count={} note_count={}",
            self.mirror.slot(),
            stored_count,
            self.notes.len()
        );
        true
    }

    fn persist(&mut self) -> Option<MirrorError> {
        if !self.slot_readable && !self.reload_unreadable() {
            warn!(
                "event=store_persist module=store status=refused slot={} note_count={} reason=slot_unreadable",
                self.mirror.slot(),
                self.notes.len()
            );
            return Some(MirrorError::SlotUnreadable {
                slot: self.mirror.slot().to_string(),
            });
        }
        let result = encode_notes(&self.notes).and_then(|payload| self.mirror.write_slot(&payload));
        match result {
            Ok(()) => None,
            Err(err) => {
                error!(
                    "event=store_persist module=store status=error slot={} note_count={} error={}",
                    self.mirror.slot(),
                    self.notes.len(),
                    err
                );
                Some(err)
            }
        }
    }
}
