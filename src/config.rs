//! Hardware and relay configuration constants for the ESP32-S3 bridge

/// GPIO assignments
pub mod pins {
    /// UART RX from the host (host TX)
    pub const UART_RX: u8 = 18;
    /// UART TX to the host (host RX)
    pub const UART_TX: u8 = 17;
    /// Host "TX enable" line, rising edge arms a capture
    pub const TRIGGER: u8 = 2;
}

/// Serial configuration
pub mod serial {
    /// Host link baud rate (8N1)
    pub const BAUD_RATE: u32 = 1_000_000;
}

/// Capture window configuration
pub mod capture {
    /// Capture buffer capacity in bytes
    pub const BUFFER_CAPACITY: usize = 256;

    /// Idle period that closes a capture window
    pub const IDLE_TIMEOUT_MS: u64 = 50;

    /// Main loop sleep between trigger checks
    pub const TRIGGER_POLL_INTERVAL_MS: u64 = 1;

    /// Consecutive send attempts before a trigger is abandoned.
    /// `None` retries until the link accepts a frame.
    pub const MAX_SEND_ATTEMPTS: Option<u32> = None;
}

/// Wireless link configuration
pub mod link {
    use super::capture::BUFFER_CAPACITY;

    /// MAC address of the motor-side ESP
    pub const PEER_ADDRESS: [u8; 6] = [0x24, 0xEC, 0x4A, 0xC9, 0x5C, 0xD4];

    /// Largest ESP-NOW (v1) payload
    pub const MAX_DATAGRAM_LEN: usize = 250;

    /// Captured payload plus the length trailer
    pub const MAX_FRAME_LEN: usize = BUFFER_CAPACITY + 1;
}

/// Heap reserved for the Wi-Fi stack
pub mod heap {
    pub const SIZE: usize = 72 * 1024;
}
