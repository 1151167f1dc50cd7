pub mod passthrough;

pub use passthrough::{PassthroughRelay, RelayError};
