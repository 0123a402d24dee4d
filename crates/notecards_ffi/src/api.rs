//! FFI use-case API for host UI calls.
//!
//! # Responsibility
//! - Expose note list/search, create and delete to the host UI via FRB.
//! - Keep error semantics simple: envelopes with `ok` + message.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - The slot is loaded once per process; the in-memory list stays
//!   authoritative when a later write fails.
//!
//! Speech capture runs in the host, configured from `speech_settings`;
//! dictated text reaches core through `note_create` like typed text.

use log::warn;
use notecards_core::{
    core_version as core_version_inner, derive_preview_text, filter_notes,
    init_logging as init_logging_inner, ping as ping_inner, CoreConfig, Note, NoteStore,
    SqliteMirror,
};
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

const PREVIEW_MAX_CHARS: usize = 120;
static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static NOTE_STORE: Mutex<Option<NoteStore<SqliteMirror>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); empty
///   uses the configured level.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        core_config().log_level.as_str().to_string()
    } else {
        level
    };
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Recognition settings the host speech engine should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSettings {
    /// Language tag, e.g. `pt-BR`.
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

/// Returns the configured speech recognition settings.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Invalid `NOTECARDS_SPEECH_LANG` falls back to the default language.
#[flutter_rust_bridge::frb(sync)]
pub fn speech_settings() -> SpeechSettings {
    let speech = &core_config().speech;
    SpeechSettings {
        language: speech.language.clone(),
        continuous: speech.continuous,
        interim_results: speech.interim_results,
        max_alternatives: speech.max_alternatives,
    }
}

/// One note row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    /// Stable note ID in string form.
    pub note_id: String,
    /// Creation time in epoch milliseconds.
    pub created_at_ms: i64,
    /// Full note body.
    pub content: String,
    /// Single-line summary for compact cards.
    pub preview: String,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    /// Visible notes, newest first.
    pub items: Vec<NoteItem>,
    /// Number of notes before filtering.
    pub total: u32,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Action response envelope for create/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the operation took effect.
    pub ok: bool,
    /// Affected note ID.
    pub note_id: Option<String>,
    /// Message suitable for a toast.
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note_id: String) -> Self {
        Self {
            ok: true,
            note_id: Some(note_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Lists notes matching `query` (case-insensitive substring; empty lists all).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Unreadable storage yields an empty list, not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list(query: String) -> NotesListResponse {
    let listed = with_store(|store| {
        let items = filter_notes(store.notes(), &query)
            .into_iter()
            .map(to_note_item)
            .collect::<Vec<_>>();
        (items, store.len())
    });
    match listed {
        Ok((items, total)) => {
            let message = if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("Showing {} note(s).", items.len())
            };
            NotesListResponse {
                items,
                total: u32::try_from(total).unwrap_or(u32::MAX),
                message,
            }
        }
        Err(err) => NotesListResponse {
            items: Vec::new(),
            total: 0,
            message: format!("notes_list failed: {err}"),
        },
    }
}

/// Creates a note from typed or dictated content.
///
/// # FFI contract
/// - Empty content is rejected with `ok=false` and no note is written.
/// - A failed storage write still keeps the note for this process; the
///   response carries `ok=true` with a warning message.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create(content: String) -> NoteActionResponse {
    match with_store(|store| store.create(content)) {
        Ok(Some(write)) => {
            let note_id = write.value.id().to_string();
            match write.write_error {
                None => NoteActionResponse::success("Note created with success", note_id),
                Some(err) => NoteActionResponse::success(
                    format!("Note kept for this session but not saved to storage: {err}"),
                    note_id,
                ),
            }
        }
        Ok(None) => NoteActionResponse::failure("Nothing to save."),
        Err(err) => NoteActionResponse::failure(format!("note_create failed: {err}")),
    }
}

/// Deletes one note by ID.
///
/// # FFI contract
/// - Unknown IDs succeed (idempotent delete).
/// - Malformed IDs return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> NoteActionResponse {
    let id = match Uuid::parse_str(note_id.trim()) {
        Ok(id) => id,
        Err(_) => return NoteActionResponse::failure(format!("invalid note id: `{note_id}`")),
    };
    match with_store(|store| store.delete(id).write_error) {
        Ok(None) => NoteActionResponse::success("Note deleted", id.to_string()),
        Ok(Some(err)) => NoteActionResponse::success(
            format!("Note removed for this session but storage was not updated: {err}"),
            id.to_string(),
        ),
        Err(err) => NoteActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

fn core_config() -> &'static CoreConfig {
    CORE_CONFIG.get_or_init(|| {
        CoreConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=fallback error={err}");
            CoreConfig::default()
        })
    })
}

/// Runs `f` on the process-wide store, opening it on first use.
///
/// A store whose slot was unreadable at open retries the read before `f`.
fn with_store<T>(f: impl FnOnce(&mut NoteStore<SqliteMirror>) -> T) -> Result<T, String> {
    let mut guard = NOTE_STORE.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_none() {
        let config = core_config();
        let mirror = SqliteMirror::open(&config.db_path, &config.slot)
            .map_err(|err| format!("storage open failed: {err}"))?;
        *guard = Some(NoteStore::open(mirror));
    }
    let store = guard.as_mut().ok_or_else(|| "storage unavailable".to_string())?;
    if !store.recover() {
        warn!("event=store_access module=ffi status=degraded reason=slot_unreadable");
    }
    Ok(f(store))
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        note_id: note.id().to_string(),
        created_at_ms: note.created_at(),
        content: note.content().to_string(),
        preview: derive_preview_text(note.content(), PREVIEW_MAX_CHARS).unwrap_or_default(),
    }
}
