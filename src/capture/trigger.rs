//! Edge-triggered capture request flag
//!
//! Written from the edge context (GPIO task) and read/cleared by the capture
//! loop. A single atomic word: `Release` on raise pairs with `AcqRel` on take
//! so the loop sees every edge that happened before it cleared the flag.

use core::sync::atomic::{AtomicBool, Ordering};

/// Single pending capture request. Repeated edges coalesce.
#[derive(Debug, Default)]
pub struct TriggerSignal {
    pending: AtomicBool,
}

impl TriggerSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark a capture as requested
    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
