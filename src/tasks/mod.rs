//! Embassy tasks module
//!
//! Task bodies for the firmware, generic over the transport traits so the
//! binary only has to supply concrete hardware types.

pub mod capture;
pub mod relay;
pub mod trigger;

pub use capture::capture_task;
pub use relay::relay_task;
pub use trigger::trigger_task;
