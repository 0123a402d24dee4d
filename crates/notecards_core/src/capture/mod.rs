//! Note capture: typed text or streamed speech transcription.
//!
//! # Responsibility
//! - Define the narrow contract the core needs from a platform speech engine.
//! - Own the single active recognition stream (`SpeechRecorder`).
//! - Drive the per-dialog capture workflow (`CaptureSession`).
//!
//! # Invariants
//! - At most one recognition stream is active at any time.
//! - Speech failures never escape as panics; sessions fall back to `Stopped`
//!   or to text mode.

pub mod capability;
pub mod recorder;
pub mod session;
