//! ESP-NOW driver for the wireless peer link
//!
//! Brings up the Wi-Fi stack in station mode with ESP-NOW on the current
//! channel, registers the single unencrypted peer and exposes the send and
//! receive halves through [`PeerSender`] / [`PeerReceiver`].

use esp_hal::peripherals::WIFI;
use esp_radio::esp_now::{EspNowManager, EspNowReceiver, EspNowSender, EspNowWifiInterface, PeerInfo};
use esp_radio::wifi::{WifiController, WifiMode};
use esp_radio::Controller;
use heapless::Vec;

use crate::config::link::MAX_DATAGRAM_LEN;
use crate::link::traits::{Datagram, LinkError, PeerAddress, PeerReceiver, PeerSender};

/// Running ESP-NOW link, before it is split between tasks
pub struct EspNowLink {
    wifi: WifiController<'static>,
    manager: EspNowManager<'static>,
    sender: EspNowSender<'static>,
    receiver: EspNowReceiver<'static>,
}

impl EspNowLink {
    /// Start Wi-Fi in station mode and initialise ESP-NOW
    pub fn start(radio: &'static Controller<'static>, wifi: WIFI<'static>) -> Result<Self, LinkError> {
        let (mut controller, interfaces) = esp_radio::wifi::new(radio, wifi, Default::default())
            .map_err(|e| {
                log::error!("Wi-Fi init failed: {:?}", e);
                LinkError::InitFailed
            })?;

        controller.set_mode(WifiMode::Sta).map_err(|e| {
            log::error!("Wi-Fi STA mode failed: {:?}", e);
            LinkError::InitFailed
        })?;
        controller.start().map_err(|e| {
            log::error!("Wi-Fi start failed: {:?}", e);
            LinkError::InitFailed
        })?;

        let (manager, sender, receiver) = interfaces.esp_now.split();

        Ok(Self {
            wifi: controller,
            manager,
            sender,
            receiver,
        })
    }

    /// Add the fixed peer: current channel, no encryption
    pub fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), LinkError> {
        self.manager
            .add_peer(PeerInfo {
                interface: EspNowWifiInterface::Sta,
                peer_address: *peer.as_bytes(),
                lmk: None,
                channel: None,
                encrypt: false,
            })
            .map_err(|e| {
                log::error!("ESP-NOW add peer {} failed: {:?}", peer, e);
                LinkError::PeerRegistrationFailed
            })
    }

    /// Split into independently owned send and receive halves
    pub fn split(self) -> (EspNowTx, EspNowRx) {
        (
            EspNowTx {
                _wifi: self.wifi,
                _manager: self.manager,
                inner: self.sender,
            },
            EspNowRx {
                inner: self.receiver,
            },
        )
    }
}

/// Send half. Also keeps the Wi-Fi controller alive.
pub struct EspNowTx {
    _wifi: WifiController<'static>,
    _manager: EspNowManager<'static>,
    inner: EspNowSender<'static>,
}

impl PeerSender for EspNowTx {
    async fn send(&mut self, peer: &PeerAddress, data: &[u8]) -> Result<(), LinkError> {
        if data.len() > MAX_DATAGRAM_LEN {
            return Err(LinkError::PayloadTooLarge);
        }

        self.inner
            .send_async(peer.as_bytes(), data)
            .await
            .map_err(|e| {
                log::warn!("ESP-NOW send error: {:?}", e);
                LinkError::SendFailed
            })
    }
}

/// Receive half
pub struct EspNowRx {
    inner: EspNowReceiver<'static>,
}

impl PeerReceiver for EspNowRx {
    async fn receive(&mut self) -> Result<Datagram, LinkError> {
        let received = self.inner.receive_async().await;

        let data = Vec::from_slice(received.data()).map_err(|_| LinkError::ReceiveFailed)?;
        Ok(Datagram {
            source: PeerAddress::new(received.info.src_address),
            data,
        })
    }
}
