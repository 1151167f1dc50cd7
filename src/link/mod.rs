#[cfg(feature = "embedded")]
pub mod espnow;
pub mod traits;

pub use traits::{Datagram, LinkError, PeerAddress, PeerReceiver, PeerSender};
