//! Note-taking workflow controller.
//!
//! # Responsibility
//! - Route captured content into the note store.
//! - Re-derive the visible list from the latest store state and query.
//! - Turn store and capture outcomes into user notices.
//!
//! # Invariants
//! - Every failure is reported as a notice; none aborts the workflow.
//! - `visible_notes` holds no cache; it is recomputed on every call.

use crate::capture::capability::SpeechCapability;
use crate::capture::recorder::SpeechRecorder;
use crate::capture::session::{CaptureInterruption, CaptureSession, SessionError, StartOutcome};
use crate::config::CoreConfig;
use crate::mirror::sqlite::SqliteMirror;
use crate::mirror::{DurableMirror, MirrorError};
use crate::model::note::{Note, NoteId};
use crate::notice::Notice;
use crate::search::filter::filter_notes;
use crate::store::note_store::NoteStore;
use log::warn;

pub const NOTE_CREATED_MESSAGE: &str = "Note created with success";
pub const NOTE_DELETED_MESSAGE: &str = "Note deleted";
pub const SPEECH_UNAVAILABLE_MESSAGE: &str =
    "Speech recognition is not available here; continue by typing your note";

/// Single-user note workflow over one store and one speech recorder.
pub struct NotesApp<M: DurableMirror> {
    store: NoteStore<M>,
    recorder: SpeechRecorder,
    session: CaptureSession,
    query: String,
    notices: Vec<Notice>,
}

impl<M: DurableMirror> NotesApp<M> {
    /// Loads the store from `mirror` and starts with an empty query.
    pub fn open(mirror: M, recorder: SpeechRecorder) -> Self {
        Self {
            store: NoteStore::open(mirror),
            recorder,
            session: CaptureSession::new(),
            query: String::new(),
            notices: Vec::new(),
        }
    }

    pub fn store(&self) -> &NoteStore<M> {
        &self.store
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn recorder(&self) -> &SpeechRecorder {
        &self.recorder
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Notes matching the current query, newest first.
    pub fn visible_notes(&self) -> Vec<&Note> {
        filter_notes(self.store.notes(), &self.query)
    }

    /// Returns and clears pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Opens the text editor.
    ///
    /// A session that already locked speech mode but holds no content is
    /// reset first, so an abandoned dictation does not block typing.
    pub fn choose_text(&mut self) -> Result<(), SessionError> {
        match self.session.choose_text() {
            Err(SessionError::ModeLocked { .. }) if !self.session.has_content() => {
                self.session.reset(&mut self.recorder);
                self.session.choose_text()
            }
            other => other,
        }
    }

    /// Starts dictation, falling back to text with a warning notice when the
    /// platform cannot recognize speech.
    pub fn start_recording(&mut self) -> Result<StartOutcome, SessionError> {
        let result = self.session.start_recording(&mut self.recorder);
        match &result {
            Ok(StartOutcome::FellBackToText) => {
                self.notices.push(Notice::warning(SPEECH_UNAVAILABLE_MESSAGE));
            }
            Err(SessionError::Capture(err)) => {
                self.notices
                    .push(Notice::error(format!("Could not start recording: {err}")));
            }
            _ => {}
        }
        result
    }

    pub fn stop_recording(&mut self) -> bool {
        self.session.stop_recording(&mut self.recorder)
    }

    /// Applies pending speech events to the capture buffer.
    pub fn pump_capture(&mut self) {
        match self.session.pump(&mut self.recorder) {
            Some(CaptureInterruption::EngineError(message)) => {
                self.notices
                    .push(Notice::error(format!("Recording stopped: {message}")));
            }
            Some(CaptureInterruption::Preempted) => {
                warn!("event=capture_pump module=app status=preempted");
            }
            None => {}
        }
    }

    pub fn edit_capture(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.session.edit(text)
    }

    /// Saves the capture buffer as a new note.
    ///
    /// Returns `None` when there is nothing to save.
    pub fn save_capture(&mut self) -> Option<Note> {
        self.pump_capture();
        let content = self.session.take_content(&mut self.recorder)?;
        let write = self.store.create(content)?;
        self.notices.push(Notice::success(NOTE_CREATED_MESSAGE));
        if let Some(err) = &write.write_error {
            self.notices.push(Notice::error(format!(
                "Note kept for this session but not saved to storage: {err}"
            )));
        }
        Some(write.value)
    }

    /// Abandons the current capture.
    pub fn discard_capture(&mut self) {
        self.session.reset(&mut self.recorder);
    }

    /// Deletes one note and acknowledges it.
    ///
    /// Returns whether a note was removed.
    pub fn delete_note(&mut self, id: NoteId) -> bool {
        let before = self.store.len();
        let write = self.store.delete(id);
        let removed = write.value.len() < before;
        self.notices.push(Notice::success(NOTE_DELETED_MESSAGE));
        if let Some(err) = &write.write_error {
            self.notices.push(Notice::error(format!(
                "Note removed for this session but storage was not updated: {err}"
            )));
        }
        removed
    }

    pub fn into_store(self) -> NoteStore<M> {
        self.store
    }
}

impl NotesApp<SqliteMirror> {
    /// Opens the app on the SQLite slot and speech settings in `config`.
    pub fn open_with_config(
        config: &CoreConfig,
        capability: Box<dyn SpeechCapability>,
    ) -> Result<Self, MirrorError> {
        let mirror = SqliteMirror::open(&config.db_path, &config.slot)?;
        Ok(Self::open(mirror, SpeechRecorder::from_config(capability, config)))
    }
}
