//! Core use-case services.
//!
//! # Responsibility
//! - Wire the note store, search filter and capture session into the
//!   user-facing note workflow.
//! - Keep hosts decoupled from storage and speech details.

pub mod notes_app;
