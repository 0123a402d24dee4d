//! Capture workflow for one "add note" dialog.
//!
//! # Responsibility
//! - Track the chosen capture mode and the speech state machine.
//! - Hold the content buffer until the user saves.
//!
//! # Invariants
//! - The mode is chosen once; switching requires `reset`.
//! - Speech states only move `Idle -> Recording -> Stopped`.
//! - In `Recording`, each transcript replaces the buffer in full.
//! - `has_content` is derived from the buffer, never stored.

use crate::capture::capability::{CaptureError, RecognitionEvent, RecordingTicket};
use crate::capture::recorder::SpeechRecorder;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How content is being captured in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Text,
    Speech,
}

/// Speech-mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    Idle,
    Recording,
    /// Terminal for the session.
    Stopped,
}

/// Outcome of a successful `start_recording` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Recording(RecordingTicket),
    /// No speech engine; the session continues in text mode.
    FellBackToText,
}

/// Why an active recording ended without the user stopping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureInterruption {
    EngineError(String),
    /// Another session took over the speech engine.
    Preempted,
}

/// Session workflow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    ModeLocked {
        current: CaptureMode,
        requested: CaptureMode,
    },
    /// The buffer cannot be edited before a mode is chosen.
    ModeNotSelected,
    /// Speech mode already reached `Stopped` in this session.
    RecordingFinished,
    Capture(CaptureError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModeLocked { current, requested } => write!(
                f,
                "capture mode is locked to {current:?}; reset before switching to {requested:?}"
            ),
            Self::ModeNotSelected => write!(f, "choose text or speech capture first"),
            Self::RecordingFinished => write!(f, "recording already finished for this note"),
            Self::Capture(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Capture(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(value: CaptureError) -> Self {
        Self::Capture(value)
    }
}

/// Transient workflow producing content for one new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    mode: Option<CaptureMode>,
    speech: SpeechState,
    ticket: Option<RecordingTicket>,
    buffer: String,
    onboarding: bool,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            mode: None,
            speech: SpeechState::Idle,
            ticket: None,
            buffer: String::new(),
            onboarding: true,
        }
    }

    pub fn mode(&self) -> Option<CaptureMode> {
        self.mode
    }

    pub fn speech_state(&self) -> SpeechState {
        self.speech
    }

    pub fn is_recording(&self) -> bool {
        self.speech == SpeechState::Recording
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn has_content(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Whether the host should show the "record or type" prompt instead of
    /// the editor.
    pub fn shows_onboarding(&self) -> bool {
        self.onboarding
    }

    /// Selects text mode and opens the editor.
    pub fn choose_text(&mut self) -> Result<(), SessionError> {
        match self.mode {
            None | Some(CaptureMode::Text) => {
                self.mode = Some(CaptureMode::Text);
                self.onboarding = false;
                Ok(())
            }
            Some(CaptureMode::Speech) => Err(SessionError::ModeLocked {
                current: CaptureMode::Speech,
                requested: CaptureMode::Text,
            }),
        }
    }

    /// Selects speech mode and starts recording through `recorder`.
    ///
    /// When the platform has no speech engine the session switches to text
    /// mode and returns `StartOutcome::FellBackToText`.
    pub fn start_recording(
        &mut self,
        recorder: &mut SpeechRecorder,
    ) -> Result<StartOutcome, SessionError> {
        match (self.mode, self.speech) {
            (Some(CaptureMode::Text), _) => {
                return Err(SessionError::ModeLocked {
                    current: CaptureMode::Text,
                    requested: CaptureMode::Speech,
                })
            }
            (Some(CaptureMode::Speech), SpeechState::Recording) => {
                if let Some(ticket) = self.ticket {
                    return Ok(StartOutcome::Recording(ticket));
                }
            }
            (Some(CaptureMode::Speech), SpeechState::Stopped) => {
                return Err(SessionError::RecordingFinished)
            }
            _ => {}
        }

        match recorder.start() {
            Ok(ticket) => {
                self.mode = Some(CaptureMode::Speech);
                self.speech = SpeechState::Recording;
                self.ticket = Some(ticket);
                self.onboarding = false;
                Ok(StartOutcome::Recording(ticket))
            }
            Err(CaptureError::Unavailable) => {
                warn!("event=capture_start module=capture status=fallback mode=text reason=speech_unavailable");
                self.mode = Some(CaptureMode::Text);
                self.onboarding = false;
                Ok(StartOutcome::FellBackToText)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Stops the recording. Returns whether a recording was active.
    pub fn stop_recording(&mut self, recorder: &mut SpeechRecorder) -> bool {
        if self.speech != SpeechState::Recording {
            return false;
        }
        if let Some(ticket) = self.ticket {
            recorder.stop_ticket(ticket);
        }
        self.speech = SpeechState::Stopped;
        info!(
            "event=capture_stop module=capture status=ok buffer_chars={}",
            self.buffer.chars().count()
        );
        true
    }

    /// Applies queued engine events to this session.
    ///
    /// Transcripts replace the buffer. An engine error or losing the engine to
    /// another recording moves the session to `Stopped` and is returned. Once
    /// preempted, queued events for this recording are discarded unapplied.
    pub fn pump(&mut self, recorder: &mut SpeechRecorder) -> Option<CaptureInterruption> {
        let ticket = self.ticket?;
        let events = recorder.take_events(ticket);
        if self.speech != SpeechState::Recording {
            return None;
        }

        if recorder.active_ticket() != Some(ticket) {
            warn!(
                "event=capture_preempted module=capture status=stopped ticket={ticket} discarded_events={}",
                events.len()
            );
            self.speech = SpeechState::Stopped;
            return Some(CaptureInterruption::Preempted);
        }

        for event in events {
            match event {
                RecognitionEvent::Transcript(transcript) => {
                    self.buffer = transcript;
                }
                RecognitionEvent::Error(message) => {
                    error!("event=capture_engine_error module=capture status=error ticket={ticket} error={message}");
                    recorder.stop_ticket(ticket);
                    self.speech = SpeechState::Stopped;
                    return Some(CaptureInterruption::EngineError(message));
                }
            }
        }
        None
    }

    /// Replaces the buffer with user-edited text.
    ///
    /// Clearing the buffer brings the onboarding prompt back without changing
    /// the mode or speech state.
    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.mode.is_none() {
            return Err(SessionError::ModeNotSelected);
        }
        self.buffer = text.into();
        if self.buffer.is_empty() {
            self.onboarding = true;
        }
        Ok(())
    }

    /// Takes the buffer for saving and resets the session.
    ///
    /// Returns `None` and leaves the session untouched when the buffer is
    /// empty. Any active recording is stopped first.
    pub fn take_content(&mut self, recorder: &mut SpeechRecorder) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        self.stop_recording(recorder);
        let content = std::mem::take(&mut self.buffer);
        *self = Self::new();
        Some(content)
    }

    /// Discards everything and returns to the initial onboarding state.
    pub fn reset(&mut self, recorder: &mut SpeechRecorder) {
        self.stop_recording(recorder);
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CaptureInterruption, CaptureMode, CaptureSession, SessionError, SpeechState, StartOutcome,
    };
    use crate::capture::capability::{
        CaptureError, RecognitionConfig, RecognitionStream, SpeechCapability, TranscriptSink,
        UnavailableSpeech,
    };
    use crate::capture::recorder::SpeechRecorder;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Sinks = Rc<RefCell<Vec<TranscriptSink>>>;

    struct FakeSpeech {
        sinks: Sinks,
    }

    struct FakeStream;

    impl RecognitionStream for FakeStream {
        fn start(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    impl SpeechCapability for FakeSpeech {
        fn is_available(&self) -> bool {
            true
        }

        fn open(
            &self,
            _config: &RecognitionConfig,
            sink: TranscriptSink,
        ) -> Result<Box<dyn RecognitionStream>, CaptureError> {
            self.sinks.borrow_mut().push(sink);
            Ok(Box::new(FakeStream))
        }
    }

    fn fake_recorder() -> (SpeechRecorder, Sinks) {
        let sinks: Sinks = Rc::default();
        let recorder = SpeechRecorder::new(
            Box::new(FakeSpeech {
                sinks: Rc::clone(&sinks),
            }),
            RecognitionConfig::default(),
        );
        (recorder, sinks)
    }

    #[test]
    fn starts_in_onboarding_without_content() {
        let session = CaptureSession::new();
        assert!(session.shows_onboarding());
        assert!(!session.has_content());
        assert_eq!(session.mode(), None);
        assert_eq!(session.speech_state(), SpeechState::Idle);
    }

    #[test]
    fn text_mode_edits_become_content() {
        let (mut recorder, _sinks) = fake_recorder();
        let mut session = CaptureSession::new();
        assert_eq!(session.edit("x"), Err(SessionError::ModeNotSelected));

        session.choose_text().unwrap();
        assert!(!session.shows_onboarding());
        session.edit("Buy milk").unwrap();
        assert!(session.has_content());

        assert_eq!(session.take_content(&mut recorder).as_deref(), Some("Buy milk"));
        assert_eq!(session, CaptureSession::new());
    }

    #[test]
    fn clearing_buffer_shows_onboarding_but_keeps_mode() {
        let mut session = CaptureSession::new();
        session.choose_text().unwrap();
        session.edit("draft").unwrap();
        session.edit("").unwrap();

        assert!(session.shows_onboarding());
        assert!(!session.has_content());
        assert_eq!(session.mode(), Some(CaptureMode::Text));
    }

    #[test]
    fn empty_buffer_is_not_taken() {
        let (mut recorder, _sinks) = fake_recorder();
        let mut session = CaptureSession::new();
        session.choose_text().unwrap();
        assert_eq!(session.take_content(&mut recorder), None);
        assert_eq!(session.mode(), Some(CaptureMode::Text));
    }

    #[test]
    fn transcripts_replace_buffer_in_full() {
        let (mut recorder, sinks) = fake_recorder();
        let mut session = CaptureSession::new();
        let outcome = session.start_recording(&mut recorder).unwrap();
        assert!(matches!(outcome, StartOutcome::Recording(_)));
        assert!(session.is_recording());

        sinks.borrow()[0].transcript("buy");
        sinks.borrow()[0].transcript("buy milk");
        assert_eq!(session.pump(&mut recorder), None);
        assert_eq!(session.buffer(), "buy milk");

        assert!(session.stop_recording(&mut recorder));
        assert!(!session.stop_recording(&mut recorder));
        assert_eq!(session.speech_state(), SpeechState::Stopped);
        assert!(!recorder.is_active());
        assert_eq!(session.buffer(), "buy milk");
    }

    #[test]
    fn engine_error_stops_session() {
        let (mut recorder, sinks) = fake_recorder();
        let mut session = CaptureSession::new();
        session.start_recording(&mut recorder).unwrap();
        sinks.borrow()[0].transcript("partial");
        sinks.borrow()[0].error("network");
        sinks.borrow()[0].transcript("ignored");

        assert_eq!(
            session.pump(&mut recorder),
            Some(CaptureInterruption::EngineError("network".to_string()))
        );
        assert_eq!(session.speech_state(), SpeechState::Stopped);
        assert_eq!(session.buffer(), "partial");
        assert!(!recorder.is_active());
        assert_eq!(
            session.start_recording(&mut recorder),
            Err(SessionError::RecordingFinished)
        );
    }

    #[test]
    fn second_session_preempts_first() {
        let (mut recorder, _sinks) = fake_recorder();
        let mut first = CaptureSession::new();
        let mut second = CaptureSession::new();
        first.start_recording(&mut recorder).unwrap();
        second.start_recording(&mut recorder).unwrap();

        assert_eq!(
            first.pump(&mut recorder),
            Some(CaptureInterruption::Preempted)
        );
        assert_eq!(first.speech_state(), SpeechState::Stopped);
        assert!(second.is_recording());
        assert!(!first.stop_recording(&mut recorder));
        assert!(recorder.is_active());
    }

    #[test]
    fn preempted_session_ignores_late_transcripts() {
        let (mut recorder, sinks) = fake_recorder();
        let mut first = CaptureSession::new();
        let mut second = CaptureSession::new();
        first.start_recording(&mut recorder).unwrap();
        second.start_recording(&mut recorder).unwrap();
        assert!(sinks.borrow()[0].transcript("late words from the old stream"));

        assert_eq!(
            first.pump(&mut recorder),
            Some(CaptureInterruption::Preempted)
        );
        assert!(!first.has_content());
        assert_eq!(second.pump(&mut recorder), None);
        assert!(!second.has_content());
    }

    #[test]
    fn unavailable_speech_falls_back_to_text() {
        let mut recorder =
            SpeechRecorder::new(Box::new(UnavailableSpeech), RecognitionConfig::default());
        let mut session = CaptureSession::new();
        assert_eq!(
            session.start_recording(&mut recorder),
            Ok(StartOutcome::FellBackToText)
        );
        assert_eq!(session.mode(), Some(CaptureMode::Text));
        session.edit("typed instead").unwrap();
        assert_eq!(session.speech_state(), SpeechState::Idle);
    }

    #[test]
    fn mode_is_locked_until_reset() {
        let (mut recorder, _sinks) = fake_recorder();
        let mut session = CaptureSession::new();
        session.choose_text().unwrap();
        assert_eq!(
            session.start_recording(&mut recorder),
            Err(SessionError::ModeLocked {
                current: CaptureMode::Text,
                requested: CaptureMode::Speech,
            })
        );

        session.reset(&mut recorder);
        assert!(session.start_recording(&mut recorder).is_ok());
        assert_eq!(
            session.choose_text(),
            Err(SessionError::ModeLocked {
                current: CaptureMode::Speech,
                requested: CaptureMode::Text,
            })
        );
    }

    #[test]
    fn saving_while_recording_releases_engine() {
        let (mut recorder, sinks) = fake_recorder();
        let mut session = CaptureSession::new();
        session.start_recording(&mut recorder).unwrap();
        sinks.borrow()[0].transcript("walk dog");
        session.pump(&mut recorder);

        assert_eq!(session.take_content(&mut recorder).as_deref(), Some("walk dog"));
        assert!(!recorder.is_active());
        assert_eq!(session.speech_state(), SpeechState::Idle);
        assert!(session.shows_onboarding());
    }
}
