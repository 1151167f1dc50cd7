pub mod traits;
#[cfg(feature = "embedded")]
pub mod uart;

pub use traits::{SerialError, SerialReader, SerialWriter};
#[cfg(feature = "embedded")]
pub use uart::{UartReader, UartWriter};
