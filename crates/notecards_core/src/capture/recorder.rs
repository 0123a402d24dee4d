//! Owner of the single active recognition stream.
//!
//! # Responsibility
//! - Acquire and release the platform speech engine.
//! - Route engine events to the recording that produced them.
//!
//! # Invariants
//! - At most one stream is active; `start` stops the previous stream before
//!   opening the next one.
//! - `stop` is idempotent.
//! - Events from a superseded recording are only delivered to that
//!   recording's ticket holder, never to the new one.

use crate::capture::capability::{
    CaptureError, RecognitionConfig, RecognitionEvent, RecognitionStream, RecordingTicket,
    SpeechCapability, TranscriptSink,
};
use crate::config::CoreConfig;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{error, info, warn};

struct ActiveRecording {
    ticket: RecordingTicket,
    stream: Box<dyn RecognitionStream>,
}

/// Process-wide speech handle.
pub struct SpeechRecorder {
    capability: Box<dyn SpeechCapability>,
    config: RecognitionConfig,
    active: Option<ActiveRecording>,
    next_ticket: u64,
    sender: Sender<(RecordingTicket, RecognitionEvent)>,
    receiver: Receiver<(RecordingTicket, RecognitionEvent)>,
    pending: Vec<(RecordingTicket, RecognitionEvent)>,
}

impl SpeechRecorder {
    /// Creates a recorder over `capability`. Availability is resolved by the
    /// provider, not probed here.
    pub fn new(capability: Box<dyn SpeechCapability>, config: RecognitionConfig) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            capability,
            config,
            active: None,
            next_ticket: 1,
            sender,
            receiver,
            pending: Vec::new(),
        }
    }

    /// Creates a recorder using the speech settings resolved in `config`.
    pub fn from_config(capability: Box<dyn SpeechCapability>, config: &CoreConfig) -> Self {
        Self::new(capability, config.speech.clone())
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_ticket(&self) -> Option<RecordingTicket> {
        self.active.as_ref().map(|active| active.ticket)
    }

    /// Starts a new recording, stopping the current one first.
    ///
    /// # Errors
    /// - `CaptureError::Unavailable` when the platform has no speech engine.
    /// - Engine errors from opening or starting the stream; no stream is kept
    ///   active in that case.
    pub fn start(&mut self) -> Result<RecordingTicket, CaptureError> {
        if !self.capability.is_available() {
            warn!("event=speech_start module=capture status=unavailable");
            return Err(CaptureError::Unavailable);
        }

        if let Some(previous) = self.stop() {
            info!("event=speech_preempt module=capture status=ok ticket={previous}");
        }

        let ticket = RecordingTicket(self.next_ticket);
        self.next_ticket += 1;

        let sink = TranscriptSink::new(ticket, self.sender.clone());
        let mut stream = match self.capability.open(&self.config, sink) {
            Ok(stream) => stream,
            Err(err) => {
                error!("event=speech_start module=capture status=error stage=open ticket={ticket} error={err}");
                return Err(err);
            }
        };
        if let Err(err) = stream.start() {
            error!("event=speech_start module=capture status=error stage=start ticket={ticket} error={err}");
            stream.stop();
            return Err(err);
        }

        info!(
            "event=speech_start module=capture status=ok ticket={} language={} continuous={} interim={}",
            ticket, self.config.language, self.config.continuous, self.config.interim_results
        );
        self.active = Some(ActiveRecording { ticket, stream });
        Ok(ticket)
    }

    /// Stops the active recording, if any, and returns its ticket.
    pub fn stop(&mut self) -> Option<RecordingTicket> {
        let mut active = self.active.take()?;
        active.stream.stop();
        info!(
            "event=speech_stop module=capture status=ok ticket={}",
            active.ticket
        );
        Some(active.ticket)
    }

    /// Stops the recording only when `ticket` is still the active one.
    ///
    /// Returns whether a stream was stopped.
    pub fn stop_ticket(&mut self, ticket: RecordingTicket) -> bool {
        if self.active_ticket() == Some(ticket) {
            self.stop().is_some()
        } else {
            false
        }
    }

    /// Takes the queued events reported for `ticket`, in arrival order.
    ///
    /// Events of recordings that are neither `ticket` nor active are dropped.
    pub fn take_events(&mut self, ticket: RecordingTicket) -> Vec<RecognitionEvent> {
        self.pending.extend(self.receiver.try_iter());

        let active = self.active_ticket();
        let mut taken = Vec::new();
        let mut kept = Vec::new();
        for (owner, event) in self.pending.drain(..) {
            if owner == ticket {
                taken.push(event);
            } else if Some(owner) == active {
                kept.push((owner, event));
            }
        }
        self.pending = kept;
        taken
    }
}

impl Drop for SpeechRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}
