#![cfg_attr(not(test), no_std)]

pub mod capture;
pub mod config;
pub mod link;
pub mod protocol;
pub mod relay;
pub mod serial;
pub mod time;

// These modules depend on embassy/async features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
