//! Wireless peer link traits for abstraction and testability
//!
//! These traits define the datagram interface to the single wireless peer,
//! allowing the ESP-NOW driver to be swapped with a mock for testing.

use crate::config::link::MAX_DATAGRAM_LEN;
use core::fmt;
use core::future::Future;
use heapless::Vec;

/// Errors that can occur on the wireless link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Radio stack failed to start
    InitFailed,
    /// Peer could not be added to the peer table
    PeerRegistrationFailed,
    /// Radio rejected or failed the send
    SendFailed,
    /// Reception failed
    ReceiveFailed,
    /// Datagram exceeds the link maximum
    PayloadTooLarge,
    /// Nothing to send
    EmptyPayload,
}

/// Hardware address of a wireless station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl Default for PeerAddress {
    fn default() -> Self {
        Self(crate::config::link::PEER_ADDRESS)
    }
}

impl From<[u8; 6]> for PeerAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

/// Datagram received from any station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Sender address
    pub source: PeerAddress,
    /// Payload exactly as received
    pub data: Vec<u8, MAX_DATAGRAM_LEN>,
}

/// Send half of the wireless link
pub trait PeerSender {
    /// Send one datagram to `peer`
    ///
    /// Datagram semantics: the whole frame is accepted or the call fails.
    fn send(&mut self, peer: &PeerAddress, data: &[u8]) -> impl Future<Output = Result<(), LinkError>>;
}

/// Receive half of the wireless link
pub trait PeerReceiver {
    /// Wait for the next datagram from any station
    fn receive(&mut self) -> impl Future<Output = Result<Datagram, LinkError>>;
}
