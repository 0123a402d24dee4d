//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve storage location, slot name, speech language and log level.
//! - Fall back to defaults for unset or blank variables.
//!
//! # Invariants
//! - A resolved config always carries a valid slot name and language tag.

use crate::capture::capability::{CaptureError, RecognitionConfig};
use crate::logging::{default_log_level, LogLevel};
use crate::mirror::{normalize_slot_name, MirrorError, DEFAULT_SLOT};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "NOTECARDS_DB_PATH";
pub const ENV_SLOT: &str = "NOTECARDS_SLOT";
pub const ENV_SPEECH_LANG: &str = "NOTECARDS_SPEECH_LANG";
pub const ENV_LOG_LEVEL: &str = "NOTECARDS_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "notecards.sqlite3";

/// Configuration errors; each names the offending variable.
#[derive(Debug)]
pub enum ConfigError {
    Slot(MirrorError),
    SpeechLanguage(CaptureError),
    LogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slot(err) => write!(f, "{ENV_SLOT}: {err}"),
            Self::SpeechLanguage(err) => write!(f, "{ENV_SPEECH_LANG}: {err}"),
            Self::LogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Slot(err) => Some(err),
            Self::SpeechLanguage(err) => Some(err),
            Self::LogLevel(_) => None,
        }
    }
}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file holding the slot store.
    pub db_path: PathBuf,
    /// Slot name holding the note list.
    pub slot: String,
    pub speech: RecognitionConfig,
    pub log_level: LogLevel,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            slot: DEFAULT_SLOT.to_string(),
            speech: RecognitionConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from `NOTECARDS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(slot) = read(ENV_SLOT) {
            config.slot = normalize_slot_name(&slot).map_err(ConfigError::Slot)?;
        }
        if let Some(language) = read(ENV_SPEECH_LANG) {
            config.speech = config
                .speech
                .with_language(&language)
                .map_err(ConfigError::SpeechLanguage)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = LogLevel::parse(&level).map_err(ConfigError::LogLevel)?;
        }

        Ok(config)
    }
}
