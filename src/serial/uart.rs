//! Serial trait adapters over `embedded_io_async`.
//!
//! Wraps the esp-hal async UART halves (or any other `Read`/`Write`
//! implementation) so the capture controller and relay can use them.

use embassy_time::{with_timeout, Duration};
use embedded_io::{Error, ErrorKind};
use embedded_io_async::{Read, Write};

use crate::serial::traits::{SerialError, SerialReader, SerialWriter};

fn map_read_error(kind: ErrorKind) -> SerialError {
    match kind {
        ErrorKind::InvalidData => SerialError::FramingError,
        ErrorKind::OutOfMemory => SerialError::OverflowError,
        ErrorKind::TimedOut => SerialError::Timeout,
        _ => SerialError::ReadError,
    }
}

/// Byte-at-a-time reader with a timeout.
pub struct UartReader<R> {
    inner: R,
}

impl<R: Read> UartReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> SerialReader for UartReader<R> {
    async fn read_byte(&mut self, timeout_ms: u64) -> Result<Option<u8>, SerialError> {
        let mut byte = [0u8; 1];

        match with_timeout(Duration::from_millis(timeout_ms), self.inner.read(&mut byte)).await {
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(_)) => Ok(Some(byte[0])),
            Ok(Err(e)) => Err(map_read_error(e.kind())),
            // Idle for the whole window
            Err(_) => Ok(None),
        }
    }
}

/// Best-effort writer.
pub struct UartWriter<W> {
    inner: W,
}

impl<W: Write> UartWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> SerialWriter for UartWriter<W> {
    async fn write(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.inner
            .write_all(data)
            .await
            .map_err(|_| SerialError::WriteError)
    }
}
