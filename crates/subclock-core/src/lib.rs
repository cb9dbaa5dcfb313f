//! # SubClock Core
//!
//! Configuration and error types shared by the scheduler, the gateway and
//! the `subclock` binary.

pub mod config;
pub mod error;

pub use config::{GatewayConfig, LimitsConfig, NotifierConfig, SubClockConfig};
pub use error::{Result, SubClockError};
