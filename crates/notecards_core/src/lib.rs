//! Core domain logic for Notecards.
//! This crate is the single source of truth for note invariants.

pub mod capture;
pub mod config;
pub mod db;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod notice;
pub mod search;
pub mod service;
pub mod store;

pub use capture::capability::{
    CaptureError, RecognitionConfig, RecognitionEvent, RecognitionStream, RecordingTicket,
    SpeechCapability, TranscriptSink, UnavailableSpeech,
};
pub use capture::recorder::SpeechRecorder;
pub use capture::session::{
    CaptureInterruption, CaptureMode, CaptureSession, SessionError, SpeechState, StartOutcome,
};
pub use config::{ConfigError, CoreConfig};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use mirror::memory::MemoryMirror;
pub use mirror::sqlite::SqliteMirror;
pub use mirror::{DurableMirror, MirrorError, MirrorResult, DEFAULT_SLOT};
pub use model::note::{derive_preview_text, Note, NoteId, NoteValidationError};
pub use notice::{Notice, NoticeLevel};
pub use search::filter::{filter_notes, matches_query};
pub use service::notes_app::NotesApp;
pub use store::note_store::{load_initial, NoteStore, StoreWrite};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
