//! Domain model for captured notes.
//!
//! # Responsibility
//! - Define the canonical note record owned by the note store.
//! - Keep note invariants checkable on both create and decode paths.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Notes are immutable; deletion removes the record entirely.

pub mod note;
