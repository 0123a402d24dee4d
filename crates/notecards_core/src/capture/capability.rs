//! Speech capability contract.
//!
//! The platform (browser, OS service, embedded engine) implements
//! [`SpeechCapability`]. Results flow back through a [`TranscriptSink`]
//! handed to the stream when it is opened; the core drains them on its own
//! thread.

use crossbeam_channel::Sender;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Language tag used when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "pt-BR";

/// Recognition parameters passed to the platform engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// BCP 47 style language tag, e.g. `pt-BR`.
    pub language: String,
    /// Keep listening across pauses until stopped.
    pub continuous: bool,
    /// Deliver partial results while the user is speaking.
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

impl RecognitionConfig {
    /// Returns a copy using `language`, normalized.
    pub fn with_language(mut self, language: &str) -> Result<Self, CaptureError> {
        self.language = normalize_language_tag(language)?;
        Ok(self)
    }
}

/// Normalizes a language tag: primary subtag lowercase, two-letter region
/// uppercase, other subtags untouched.
///
/// Accepts `[A-Za-z0-9]{1,8}` subtags joined by `-` (or `_`), with an
/// alphabetic primary subtag of 2..=3 letters.
pub fn normalize_language_tag(value: &str) -> Result<String, CaptureError> {
    let trimmed = value.trim();
    let invalid = || CaptureError::InvalidLanguageTag(value.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut normalized = Vec::new();
    for (index, subtag) in trimmed.split(['-', '_']).enumerate() {
        let valid_chars = !subtag.is_empty()
            && subtag.len() <= 8
            && subtag.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !valid_chars {
            return Err(invalid());
        }
        let alphabetic = subtag.chars().all(|ch| ch.is_ascii_alphabetic());
        if index == 0 {
            if !alphabetic || !(2..=3).contains(&subtag.len()) {
                return Err(invalid());
            }
            normalized.push(subtag.to_ascii_lowercase());
        } else if alphabetic && subtag.len() == 2 {
            normalized.push(subtag.to_ascii_uppercase());
        } else {
            normalized.push(subtag.to_string());
        }
    }
    Ok(normalized.join("-"))
}

/// Identifies one recording started through the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordingTicket(pub(crate) u64);

impl Display for RecordingTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "rec-{}", self.0)
    }
}

/// Event reported by a running recognition stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Full transcript recognized so far; supersedes earlier transcripts.
    Transcript(String),
    /// Engine-reported failure.
    Error(String),
}

/// Write end handed to the platform for one recording.
#[derive(Debug, Clone)]
pub struct TranscriptSink {
    ticket: RecordingTicket,
    sender: Sender<(RecordingTicket, RecognitionEvent)>,
}

impl TranscriptSink {
    pub(crate) fn new(
        ticket: RecordingTicket,
        sender: Sender<(RecordingTicket, RecognitionEvent)>,
    ) -> Self {
        Self { ticket, sender }
    }

    pub fn ticket(&self) -> RecordingTicket {
        self.ticket
    }

    /// Reports the cumulative transcript.
    ///
    /// Returns `false` when the recorder is gone and the event was dropped.
    pub fn transcript(&self, cumulative: impl Into<String>) -> bool {
        self.send(RecognitionEvent::Transcript(cumulative.into()))
    }

    /// Reports a result list, joining the best alternative of each result in
    /// order into one cumulative transcript.
    pub fn results<I, S>(&self, best_alternatives: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let transcript = best_alternatives
            .into_iter()
            .fold(String::new(), |mut text, segment| {
                text.push_str(segment.as_ref());
                text
            });
        self.transcript(transcript)
    }

    /// Reports an engine failure.
    pub fn error(&self, message: impl Into<String>) -> bool {
        self.send(RecognitionEvent::Error(message.into()))
    }

    fn send(&self, event: RecognitionEvent) -> bool {
        self.sender.send((self.ticket, event)).is_ok()
    }
}

/// One open recognition stream.
pub trait RecognitionStream {
    /// Begins listening.
    fn start(&mut self) -> Result<(), CaptureError>;
    /// Stops listening and releases the engine. Must tolerate repeated calls.
    fn stop(&mut self);
}

/// Platform speech-to-text provider.
pub trait SpeechCapability {
    /// Whether this platform can recognize speech at all.
    fn is_available(&self) -> bool;
    /// Opens a stream configured with `config` that reports into `sink`.
    fn open(
        &self,
        config: &RecognitionConfig,
        sink: TranscriptSink,
    ) -> Result<Box<dyn RecognitionStream>, CaptureError>;
}

/// Provider for platforms without speech recognition.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSpeech;

impl SpeechCapability for UnavailableSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn open(
        &self,
        _config: &RecognitionConfig,
        _sink: TranscriptSink,
    ) -> Result<Box<dyn RecognitionStream>, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

/// Speech capability failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No speech engine on this platform.
    Unavailable,
    InvalidLanguageTag(String),
    /// Engine refused to open or start.
    Engine(String),
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "speech recognition is not available on this platform"),
            Self::InvalidLanguageTag(value) => write!(f, "invalid language tag: `{value}`"),
            Self::Engine(message) => write!(f, "speech engine error: {message}"),
        }
    }
}

impl Error for CaptureError {}
