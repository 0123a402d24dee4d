//! In-process slot backend.
//!
//! Useful for hosts that persist elsewhere and for tests. An optional byte
//! quota mimics browser-style storage limits.

use crate::mirror::{DurableMirror, MirrorError, MirrorResult, DEFAULT_SLOT};

/// Slot kept in memory for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct MemoryMirror {
    slot: String,
    value: Option<String>,
    quota_bytes: Option<usize>,
    write_count: usize,
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT)
    }
}

impl MemoryMirror {
    /// Creates an empty slot.
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            value: None,
            quota_bytes: None,
            write_count: 0,
        }
    }

    /// Creates a slot pre-filled with `payload`, as if written by an earlier run.
    pub fn with_payload(slot: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut mirror = Self::new(slot);
        mirror.value = Some(payload.into());
        mirror
    }

    /// Limits accepted payload size in bytes.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Current raw payload.
    pub fn payload(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.write_count
    }
}

impl DurableMirror for MemoryMirror {
    fn slot(&self) -> &str {
        &self.slot
    }

    fn read_slot(&self) -> MirrorResult<Option<String>> {
        Ok(self.value.clone())
    }

    fn write_slot(&mut self, payload: &str) -> MirrorResult<()> {
        if let Some(quota) = self.quota_bytes {
            if payload.len() > quota {
                return Err(MirrorError::QuotaExceeded {
                    slot: self.slot.clone(),
                    needed: payload.len(),
                    quota,
                });
            }
        }
        self.value = Some(payload.to_string());
        self.write_count += 1;
        Ok(())
    }
}
