//! Relay task: wireless datagrams to the host serial link.

use embassy_time::{Duration, Timer};

use crate::link::traits::PeerReceiver;
use crate::relay::passthrough::{PassthroughRelay, RelayError};
use crate::serial::traits::SerialWriter;

/// Task that copies every received datagram to serial
pub async fn relay_task<R: PeerReceiver, W: SerialWriter>(mut receiver: R, mut writer: W) {
    let mut relay = PassthroughRelay::new();

    loop {
        match relay.relay_next(&mut receiver, &mut writer).await {
            Ok(_) => {}
            Err(RelayError::Serial(_)) => {
                // Best effort, already logged; drop the datagram
            }
            Err(RelayError::Link(e)) => {
                log::warn!("Relay: receive error {:?}", e);
                Timer::after(Duration::from_millis(10)).await;
            }
        }
    }
}
