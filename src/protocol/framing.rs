//! Datagram framing for captured serial data
//!
//! Wire format of one outbound datagram:
//!
//! ```text
//! [payload: 1..=256 bytes][trailer: payload length mod 256]
//! ```
//!
//! No sync marker, CRC or version. A full 256-byte capture carries a
//! trailer of 0; receivers rely on that wraparound, so it must not change.

use crate::capture::buffer::CaptureBuffer;
use crate::config::link::MAX_FRAME_LEN;
use crate::link::traits::{LinkError, PeerAddress, PeerSender};
use heapless::Vec;

/// Captured payload followed by its length trailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    bytes: Vec<u8, MAX_FRAME_LEN>,
}

impl OutboundFrame {
    /// Entire frame including trailer
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    pub fn trailer(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Builds frames from capture buffers and hands them to the link
pub struct DatagramFramer;

impl DatagramFramer {
    /// Create a new framer
    pub fn new() -> Self {
        Self
    }

    /// Frame the buffer contents.
    ///
    /// Returns `None` for an empty buffer.
    pub fn encode(&self, buffer: &CaptureBuffer) -> Option<OutboundFrame> {
        if buffer.is_empty() {
            return None;
        }

        let mut bytes = Vec::new();
        // Capacity is one more than the buffer, both writes always fit
        let _ = bytes.extend_from_slice(buffer.as_slice());
        let _ = bytes.push(buffer.len() as u8);

        Some(OutboundFrame { bytes })
    }

    /// Frame the buffer and send it to `peer`.
    ///
    /// Returns the number of bytes handed to the link.
    pub async fn submit<S: PeerSender>(
        &self,
        link: &mut S,
        peer: &PeerAddress,
        buffer: &CaptureBuffer,
    ) -> Result<usize, LinkError> {
        let frame = self.encode(buffer).ok_or(LinkError::EmptyPayload)?;
        link.send(peer, frame.as_slice()).await?;
        Ok(frame.len())
    }
}

impl Default for DatagramFramer {
    fn default() -> Self {
        Self::new()
    }
}
