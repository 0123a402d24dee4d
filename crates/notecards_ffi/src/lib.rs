//! Flutter-facing FFI surface for Notecards.

pub mod api;
