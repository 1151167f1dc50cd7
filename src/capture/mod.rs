pub mod buffer;
pub mod controller;
pub mod trigger;

pub use buffer::CaptureBuffer;
pub use controller::{CaptureConfig, CaptureController, CaptureSession, CaptureState, CycleOutcome};
pub use trigger::TriggerSignal;
