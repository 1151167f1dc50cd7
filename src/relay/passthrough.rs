//! Wireless to serial passthrough
//!
//! Every datagram received from any station is written to the host serial
//! link exactly as received. The sending side's length trailer is ordinary
//! payload here.

use crate::link::traits::{Datagram, LinkError, PeerReceiver};
use crate::serial::traits::{SerialError, SerialWriter};

/// Errors from one relay step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    Link(LinkError),
    Serial(SerialError),
}

/// Verbatim datagram forwarder
pub struct PassthroughRelay {
    forwarded: u32,
    bytes_forwarded: u32,
}

impl PassthroughRelay {
    /// Create a new relay
    pub fn new() -> Self {
        Self {
            forwarded: 0,
            bytes_forwarded: 0,
        }
    }

    /// Write one datagram to the serial link
    pub async fn forward<W: SerialWriter>(
        &mut self,
        writer: &mut W,
        datagram: &Datagram,
    ) -> Result<(), SerialError> {
        if datagram.data.is_empty() {
            return Ok(());
        }

        writer.write(&datagram.data).await.map_err(|e| {
            log::warn!("Relay: serial write of {} bytes failed: {:?}", datagram.data.len(), e);
            e
        })?;

        self.forwarded = self.forwarded.wrapping_add(1);
        self.bytes_forwarded = self.bytes_forwarded.wrapping_add(datagram.data.len() as u32);
        Ok(())
    }

    /// Wait for the next datagram and forward it
    pub async fn relay_next<R: PeerReceiver, W: SerialWriter>(
        &mut self,
        receiver: &mut R,
        writer: &mut W,
    ) -> Result<usize, RelayError> {
        let datagram = receiver.receive().await.map_err(RelayError::Link)?;

        log::debug!("Relay: {} bytes from {}", datagram.data.len(), datagram.source);

        self.forward(writer, &datagram).await.map_err(RelayError::Serial)?;
        Ok(datagram.data.len())
    }

    /// Datagrams written to serial so far
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }

    /// Payload bytes written to serial so far
    pub fn bytes_forwarded(&self) -> u32 {
        self.bytes_forwarded
    }
}

impl Default for PassthroughRelay {
    fn default() -> Self {
        Self::new()
    }
}
