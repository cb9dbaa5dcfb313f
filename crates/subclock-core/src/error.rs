//! Error types for SubClock.

use thiserror::Error;

/// Top-level error for configuration and construction failures.
#[derive(Debug, Error)]
pub enum SubClockError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SubClockError>;
