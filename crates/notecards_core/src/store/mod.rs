//! Note store: single source of truth for the note collection.
//!
//! # Responsibility
//! - Own the canonical in-memory note list and its durable mirror.
//! - Keep the mirror in sync by rewriting the whole list on every mutation.
//!
//! # Invariants
//! - The list never holds two notes with the same id.
//! - New notes are prepended (newest first).
//! - Mirror failures never abort a mutation; the in-memory list stays
//!   authoritative for the session.
//! - A slot that could not be read is never overwritten.

pub mod note_store;
