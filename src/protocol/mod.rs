pub mod framing;

pub use framing::{DatagramFramer, OutboundFrame};
