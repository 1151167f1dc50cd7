//! Idle-timeout capture controller
//!
//! Turns a trigger edge into one outbound datagram:
//!
//! 1. A pending trigger is taken (and cleared) and a capture window opens.
//! 2. Serial bytes are appended to the buffer. Every stored byte pushes the
//!    idle deadline out to `now + idle_timeout`.
//! 3. Once the line has been idle for the timeout the window closes. An empty
//!    window is dropped silently; otherwise the buffer is framed and sent.
//! 4. A failed send re-arms the trigger, so the next service runs a fresh
//!    capture window. The failed bytes are not kept.
//!
//! Bytes arriving after the buffer is full are read and discarded and do not
//! move the deadline. An edge arriving mid-capture stays pending for the next
//! cycle.

use crate::capture::buffer::CaptureBuffer;
use crate::capture::trigger::TriggerSignal;
use crate::config::capture;
use crate::link::traits::{LinkError, PeerAddress, PeerSender};
use crate::protocol::framing::DatagramFramer;
use crate::serial::traits::SerialReader;
use crate::time::Clock;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for a trigger
    Idle,
    /// Draining serial bytes into the buffer
    Capturing,
}

/// Tunables for the capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Silence that closes a capture window
    pub idle_timeout_ms: u64,
    /// Consecutive failed sends before the trigger is no longer re-armed.
    /// `None` keeps retrying.
    pub max_send_attempts: Option<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: capture::IDLE_TIMEOUT_MS,
            max_send_attempts: capture::MAX_SEND_ATTEMPTS,
        }
    }
}

/// Timing and byte counts for one capture window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSession {
    pub started_at_ms: u64,
    /// Arrival of the last stored byte, or the start if none
    pub last_byte_at_ms: u64,
    pub ended_at_ms: u64,
    pub bytes_accepted: usize,
    /// Bytes read after the buffer filled up
    pub bytes_dropped: usize,
}

impl CaptureSession {
    fn start(now_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
            last_byte_at_ms: now_ms,
            ended_at_ms: now_ms,
            bytes_accepted: 0,
            bytes_dropped: 0,
        }
    }

    /// Instant at which the window closes if nothing else is stored
    pub fn deadline_ms(&self, idle_timeout_ms: u64) -> u64 {
        self.last_byte_at_ms + idle_timeout_ms
    }

    pub fn is_expired(&self, now_ms: u64, idle_timeout_ms: u64) -> bool {
        now_ms >= self.deadline_ms(idle_timeout_ms)
    }

    pub fn duration_ms(&self) -> u64 {
        self.ended_at_ms - self.started_at_ms
    }
}

/// Result of one [`CaptureController::service`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No trigger was pending
    NotTriggered,
    /// Window closed with nothing captured
    Empty { session: CaptureSession },
    /// Frame accepted by the link
    Sent {
        session: CaptureSession,
        frame_len: usize,
    },
    /// Link rejected the frame
    SendFailed {
        session: CaptureSession,
        error: LinkError,
        /// Consecutive failures including this one
        attempt: u32,
        /// Whether the trigger was re-armed
        retrying: bool,
    },
}

/// Trigger-driven serial capture and flush
///
/// Owns the capture buffer and both transport halves used by the outbound
/// path. Only the trigger flag is shared with the edge context.
pub struct CaptureController<'t, R, S, C> {
    trigger: &'t TriggerSignal,
    serial: R,
    link: S,
    clock: C,
    peer: PeerAddress,
    config: CaptureConfig,
    framer: DatagramFramer,
    buffer: CaptureBuffer,
    state: CaptureState,
    consecutive_failures: u32,
}

impl<'t, R, S, C> CaptureController<'t, R, S, C>
where
    R: SerialReader,
    S: PeerSender,
    C: Clock,
{
    /// Create a controller with the default configuration
    pub fn new(trigger: &'t TriggerSignal, serial: R, link: S, clock: C, peer: PeerAddress) -> Self {
        Self {
            trigger,
            serial,
            link,
            clock,
            peer,
            config: CaptureConfig::default(),
            framer: DatagramFramer::new(),
            buffer: CaptureBuffer::new(),
            state: CaptureState::Idle,
            consecutive_failures: 0,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: CaptureConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn serial(&self) -> &R {
        &self.serial
    }

    pub fn link(&self) -> &S {
        &self.link
    }

    /// Run one capture cycle if a trigger is pending
    pub async fn service(&mut self) -> CycleOutcome {
        if !self.trigger.take() {
            return CycleOutcome::NotTriggered;
        }

        let session = self.capture().await;

        if self.buffer.is_empty() {
            log::debug!("Capture: window closed empty after {} ms", session.duration_ms());
            return CycleOutcome::Empty { session };
        }

        if session.bytes_dropped > 0 {
            log::debug!("Capture: buffer full, {} bytes dropped", session.bytes_dropped);
        }

        self.flush(session).await
    }

    /// Fill the buffer until the line has been idle for the timeout
    async fn capture(&mut self) -> CaptureSession {
        self.state = CaptureState::Capturing;
        self.buffer.clear();

        let idle = self.config.idle_timeout_ms;
        let mut session = CaptureSession::start(self.clock.now_ms());

        loop {
            let now = self.clock.now_ms();
            if session.is_expired(now, idle) {
                session.ended_at_ms = now;
                break;
            }

            let remaining = session.deadline_ms(idle) - now;
            match self.serial.read_byte(remaining).await {
                Ok(Some(byte)) => {
                    if self.buffer.push(byte) {
                        session.last_byte_at_ms = self.clock.now_ms();
                        session.bytes_accepted += 1;
                    } else {
                        session.bytes_dropped += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Capture: serial read error {:?}", e);
                }
            }
        }

        self.state = CaptureState::Idle;
        session
    }

    /// Frame and send the buffer, re-arming the trigger on failure
    async fn flush(&mut self, session: CaptureSession) -> CycleOutcome {
        match self.framer.submit(&mut self.link, &self.peer, &self.buffer).await {
            Ok(frame_len) => {
                log::debug!("Capture: sent {} bytes to {}", frame_len, self.peer);
                self.consecutive_failures = 0;
                CycleOutcome::Sent { session, frame_len }
            }
            Err(error) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let attempt = self.consecutive_failures;

                let retrying = match self.config.max_send_attempts {
                    Some(max) => attempt < max,
                    None => true,
                };

                if retrying {
                    log::warn!("Error sending data: {:?} (attempt {}), retrying", error, attempt);
                    self.trigger.raise();
                } else {
                    log::error!("Error sending data: {:?}, giving up after {} attempts", error, attempt);
                    self.consecutive_failures = 0;
                }

                CycleOutcome::SendFailed {
                    session,
                    error,
                    attempt,
                    retrying,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::capture::BUFFER_CAPACITY;
    use crate::link::traits::mock::MockPeerLink;
    use crate::serial::traits::mock::MockSerial;
    use crate::serial::traits::SerialError;
    use crate::time::mock::SimClock;

    type TestController<'a> = CaptureController<'a, MockSerial<'a>, MockPeerLink, SimClock>;

    fn controller<'a>(trigger: &'a TriggerSignal, clock: &SimClock) -> TestController<'a> {
        CaptureController::new(
            trigger,
            MockSerial::new(clock.clone()),
            MockPeerLink::new(),
            clock.clone(),
            PeerAddress::default(),
        )
    }

    fn sent_frames(ctrl: &TestController<'_>) -> std::vec::Vec<std::vec::Vec<u8>> {
        ctrl.link()
            .get_tx_history()
            .iter()
            .map(|(_, frame)| frame.to_vec())
            .collect()
    }

    #[test]
    fn test_not_triggered_reads_nothing() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.serial().queue_rx_at(0, 1, &[0x01, 0x02]);

        futures::executor::block_on(async {
            assert_eq!(ctrl.service().await, CycleOutcome::NotTriggered);
        });

        assert_eq!(ctrl.serial().pending_rx(), 2);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(ctrl.link().send_attempts(), 0);
    }

    #[test]
    fn test_end_to_end_three_bytes() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.serial().queue_rx_at(0, 5, &[0x01, 0x02, 0x03]);

        trigger.raise();
        let outcome = futures::executor::block_on(ctrl.service());

        match outcome {
            CycleOutcome::Sent { session, frame_len } => {
                assert_eq!(frame_len, 4);
                assert_eq!(session.bytes_accepted, 3);
                assert_eq!(session.last_byte_at_ms, 10);
                // 50 ms of silence after the third byte
                assert_eq!(session.ended_at_ms, 60);
            }
            other => panic!("Expected Sent, got {:?}", other),
        }

        let history = ctrl.link().get_tx_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, PeerAddress::default());
        assert_eq!(history[0].1.as_slice(), &[0x01, 0x02, 0x03, 0x03]);
        assert_eq!(ctrl.state(), CaptureState::Idle);
        assert!(!trigger.is_pending());
    }

    #[test]
    fn test_every_length_up_to_capacity() {
        for n in [1usize, 2, 17, 127, 128, 249, 250, 255, 256] {
            let clock = SimClock::new();
            let trigger = TriggerSignal::new();
            let mut ctrl = controller(&trigger, &clock);

            let data: std::vec::Vec<u8> = (0..n).map(|i| (i * 7) as u8).collect();
            ctrl.serial().queue_rx_at(3, 1, &data);

            trigger.raise();
            futures::executor::block_on(ctrl.service());

            let frames = sent_frames(&ctrl);
            assert_eq!(frames.len(), 1, "n = {}", n);
            assert_eq!(frames[0].len(), n + 1);
            assert_eq!(&frames[0][..n], data.as_slice());
            assert_eq!(frames[0][n], (n % 256) as u8);
        }
    }

    #[test]
    fn test_gaps_just_under_timeout_stay_in_one_window() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.serial().queue_rx_at(0, 49, &[0xA0, 0xA1, 0xA2, 0xA3]);

        trigger.raise();
        futures::executor::block_on(ctrl.service());

        assert_eq!(sent_frames(&ctrl), vec![vec![0xA0, 0xA1, 0xA2, 0xA3, 0x04]]);
    }

    #[test]
    fn test_gap_at_timeout_splits_window() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.serial().queue_rx_at(0, 0, &[0x01]);
        ctrl.serial().queue_rx_at(60, 0, &[0x02]);

        trigger.raise();
        futures::executor::block_on(ctrl.service());

        assert_eq!(sent_frames(&ctrl), vec![vec![0x01, 0x01]]);
        // Late byte is left for a later trigger
        assert_eq!(ctrl.serial().pending_rx(), 1);
    }

    #[test]
    fn test_empty_trigger_sends_nothing() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);

        trigger.raise();
        let outcome = futures::executor::block_on(ctrl.service());

        match outcome {
            CycleOutcome::Empty { session } => {
                assert_eq!(session.bytes_accepted, 0);
                assert_eq!(session.duration_ms(), 50);
            }
            other => panic!("Expected Empty, got {:?}", other),
        }
        assert_eq!(ctrl.link().send_attempts(), 0);
        assert!(!trigger.is_pending());
    }

    #[test]
    fn test_overflow_truncates_to_capacity() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);

        let data: std::vec::Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        ctrl.serial().queue_rx_at(0, 0, &data);

        trigger.raise();
        let outcome = futures::executor::block_on(ctrl.service());

        match outcome {
            CycleOutcome::Sent { session, frame_len } => {
                assert_eq!(frame_len, BUFFER_CAPACITY + 1);
                assert_eq!(session.bytes_accepted, BUFFER_CAPACITY);
                assert_eq!(session.bytes_dropped, 300 - BUFFER_CAPACITY);
            }
            other => panic!("Expected Sent, got {:?}", other),
        }

        let frames = sent_frames(&ctrl);
        assert_eq!(&frames[0][..BUFFER_CAPACITY], &data[..BUFFER_CAPACITY]);
        assert_eq!(frames[0][BUFFER_CAPACITY], 0x00);
    }

    #[test]
    fn test_bytes_after_full_do_not_extend_window() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);

        // Buffer fills at t = 0, then a trickle every 10 ms
        ctrl.serial().queue_rx_at(0, 0, &[0x55; BUFFER_CAPACITY]);
        ctrl.serial().queue_rx_at(10, 10, &[0x66; 10]);

        trigger.raise();
        let outcome = futures::executor::block_on(ctrl.service());

        match outcome {
            CycleOutcome::Sent { session, .. } => {
                assert_eq!(session.last_byte_at_ms, 0);
                assert_eq!(session.ended_at_ms, 50);
                // Bytes at 10..=50 were drained and dropped
                assert_eq!(session.bytes_dropped, 5);
            }
            other => panic!("Expected Sent, got {:?}", other),
        }
        assert_eq!(sent_frames(&ctrl)[0][BUFFER_CAPACITY], 0x00);
    }

    #[test]
    fn test_send_failure_rearms_fresh_capture() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.link().fail_next_sends(1, LinkError::SendFailed);
        ctrl.serial().queue_rx_at(0, 1, &[0x01, 0x02]);

        trigger.raise();
        let first = futures::executor::block_on(ctrl.service());
        match first {
            CycleOutcome::SendFailed {
                error,
                attempt,
                retrying,
                ..
            } => {
                assert_eq!(error, LinkError::SendFailed);
                assert_eq!(attempt, 1);
                assert!(retrying);
            }
            other => panic!("Expected SendFailed, got {:?}", other),
        }
        assert!(trigger.is_pending());

        // Retry captures whatever arrives next, not the failed bytes
        let now = clock.now_ms();
        ctrl.serial().queue_rx_at(now + 2, 1, &[0x03, 0x04]);

        let second = futures::executor::block_on(ctrl.service());
        assert!(matches!(second, CycleOutcome::Sent { frame_len: 3, .. }));
        assert_eq!(sent_frames(&ctrl), vec![vec![0x03, 0x04, 0x02]]);
        assert_eq!(ctrl.link().send_attempts(), 2);
        assert!(!trigger.is_pending());
    }

    #[test]
    fn test_unbounded_retry_by_default() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.link().fail_next_sends(20, LinkError::SendFailed);
        assert_eq!(ctrl.config().max_send_attempts, None);

        trigger.raise();
        for attempt in 1..=20u32 {
            let now = clock.now_ms();
            ctrl.serial().queue_rx_at(now, 0, &[0x7F]);

            let outcome = futures::executor::block_on(ctrl.service());
            assert!(
                matches!(outcome, CycleOutcome::SendFailed { attempt: a, retrying: true, .. } if a == attempt),
                "attempt {}: {:?}",
                attempt,
                outcome
            );
        }
        assert!(trigger.is_pending());
    }

    #[test]
    fn test_retry_cap_stops_rearming() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock).with_config(CaptureConfig {
            max_send_attempts: Some(2),
            ..CaptureConfig::default()
        });
        ctrl.link().fail_next_sends(5, LinkError::SendFailed);

        trigger.raise();

        ctrl.serial().queue_rx_at(clock.now_ms(), 0, &[0x01]);
        let first = futures::executor::block_on(ctrl.service());
        assert!(matches!(first, CycleOutcome::SendFailed { attempt: 1, retrying: true, .. }));
        assert!(trigger.is_pending());

        ctrl.serial().queue_rx_at(clock.now_ms(), 0, &[0x02]);
        let second = futures::executor::block_on(ctrl.service());
        assert!(matches!(second, CycleOutcome::SendFailed { attempt: 2, retrying: false, .. }));
        assert!(!trigger.is_pending());

        // A new edge starts counting from one again
        trigger.raise();
        ctrl.serial().queue_rx_at(clock.now_ms(), 0, &[0x03]);
        let third = futures::executor::block_on(ctrl.service());
        assert!(matches!(third, CycleOutcome::SendFailed { attempt: 1, retrying: true, .. }));
    }

    #[test]
    fn test_edge_during_capture_does_not_disturb_window() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.serial().queue_rx_at(0, 5, &[0x01, 0x02, 0x03]);
        ctrl.serial().raise_edge_at(30, &trigger);

        trigger.raise();
        let outcome = futures::executor::block_on(ctrl.service());

        match outcome {
            CycleOutcome::Sent { session, .. } => {
                // Deadline still runs from the last byte at t = 10
                assert_eq!(session.ended_at_ms, 60);
            }
            other => panic!("Expected Sent, got {:?}", other),
        }
        assert_eq!(sent_frames(&ctrl), vec![vec![0x01, 0x02, 0x03, 0x03]]);

        // The edge is kept for the next cycle
        assert!(trigger.is_pending());
        let next = futures::executor::block_on(ctrl.service());
        assert!(matches!(next, CycleOutcome::Empty { .. }));
        assert_eq!(ctrl.link().get_tx_history().len(), 1);
    }

    #[test]
    fn test_serial_error_does_not_abort_capture() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);
        ctrl.serial().set_next_read_error(SerialError::FramingError);
        ctrl.serial().queue_rx_at(0, 1, &[0x10, 0x11]);

        trigger.raise();
        futures::executor::block_on(ctrl.service());

        assert_eq!(sent_frames(&ctrl), vec![vec![0x10, 0x11, 0x02]]);
    }

    #[test]
    fn test_custom_idle_timeout() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock).with_config(CaptureConfig {
            idle_timeout_ms: 10,
            ..CaptureConfig::default()
        });
        ctrl.serial().queue_rx_at(0, 0, &[0x01]);
        ctrl.serial().queue_rx_at(20, 0, &[0x02]);

        trigger.raise();
        futures::executor::block_on(ctrl.service());

        assert_eq!(sent_frames(&ctrl), vec![vec![0x01, 0x01]]);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_buffer_reset_between_cycles() {
        let clock = SimClock::new();
        let trigger = TriggerSignal::new();
        let mut ctrl = controller(&trigger, &clock);

        ctrl.serial().queue_rx_at(0, 1, &[0xAA, 0xBB, 0xCC]);
        trigger.raise();
        futures::executor::block_on(ctrl.service());

        ctrl.serial().queue_rx_at(clock.now_ms() + 100, 0, &[0xDD]);
        trigger.raise();
        let second = futures::executor::block_on(ctrl.service());
        // Closes at t = 102, before 0xDD arrives
        assert!(matches!(second, CycleOutcome::Empty { .. }));

        trigger.raise();
        futures::executor::block_on(ctrl.service());

        assert_eq!(
            sent_frames(&ctrl),
            vec![vec![0xAA, 0xBB, 0xCC, 0x03], vec![0xDD, 0x01]]
        );
    }
}
