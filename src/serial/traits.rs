//! Serial port traits for abstraction and testability
//!
//! The capture path reads one byte at a time with a timeout and the relay
//! path only writes, so the two halves are separate traits. This lets the
//! UART driver be split between tasks and swapped with a mock for testing.

use core::future::Future;

/// Errors that can occur during serial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// Framing or parity error in received data
    FramingError,
    /// Receive FIFO overflow
    OverflowError,
    /// Operation timed out
    Timeout,
    /// Other receive error
    ReadError,
    /// Write error
    WriteError,
}

/// Receive half of the host serial link
pub trait SerialReader {
    /// Wait up to `timeout_ms` for a single byte
    ///
    /// Returns `Ok(None)` if nothing arrived in time.
    fn read_byte(&mut self, timeout_ms: u64) -> impl Future<Output = Result<Option<u8>, SerialError>>;
}

/// Transmit half of the host serial link
pub trait SerialWriter {
    /// Write all bytes
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), SerialError>>;
}
