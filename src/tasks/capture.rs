//! Capture task: services the trigger flag from the main loop.

use embassy_time::{Duration, Timer};

use crate::capture::controller::{CaptureController, CycleOutcome};
use crate::config::capture::TRIGGER_POLL_INTERVAL_MS;
use crate::link::traits::PeerSender;
use crate::serial::traits::SerialReader;
use crate::time::Clock;

/// Task that runs capture cycles whenever the trigger is raised
///
/// Checks the trigger every `TRIGGER_POLL_INTERVAL_MS`. A failed send re-arms
/// the trigger, so the next check starts a new capture straight away.
pub async fn capture_task<R, S, C>(mut controller: CaptureController<'static, R, S, C>)
where
    R: SerialReader,
    S: PeerSender,
    C: Clock,
{
    log::info!("Capture: sending to peer {}", controller.peer());

    loop {
        if let CycleOutcome::Sent { session, frame_len } = controller.service().await {
            log::info!(
                "Capture: {} byte frame after {} ms window",
                frame_len,
                session.duration_ms()
            );
        }

        Timer::after(Duration::from_millis(TRIGGER_POLL_INTERVAL_MS)).await;
    }
}
