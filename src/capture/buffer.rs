//! Fixed-capacity capture buffer
//!
//! Accumulates serial bytes for one capture cycle. Bytes beyond capacity are
//! dropped without error.

use crate::config::capture::BUFFER_CAPACITY;
use heapless::Vec;

/// Bytes captured during one window
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Vec<u8, BUFFER_CAPACITY>,
}

impl CaptureBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Append a byte.
    ///
    /// Returns `false` if the buffer is full and the byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        self.bytes.push(byte).is_ok()
    }

    /// Reset the write cursor for a new cycle.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.is_full()
    }

    pub const fn capacity(&self) -> usize {
        BUFFER_CAPACITY
    }
}
