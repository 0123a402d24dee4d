//! Live search over the note list.
//!
//! # Responsibility
//! - Derive the visible note subset from the full list and a query string.
//!
//! # Invariants
//! - Filtering is stateless and re-run on every query or store change.

pub mod filter;
