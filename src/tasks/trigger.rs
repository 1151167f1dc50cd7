//! Trigger task: turns rising edges on the host enable line into capture
//! requests.

use embedded_hal_async::digital::Wait;

use crate::capture::trigger::TriggerSignal;

/// Task that raises `trigger` on every rising edge of `pin`
///
/// Edges that arrive while a request is still pending coalesce into it.
pub async fn trigger_task<P: Wait>(mut pin: P, trigger: &'static TriggerSignal) {
    loop {
        match pin.wait_for_rising_edge().await {
            Ok(()) => trigger.raise(),
            Err(e) => log::warn!("Trigger: edge wait failed {:?}", e),
        }
    }
}
