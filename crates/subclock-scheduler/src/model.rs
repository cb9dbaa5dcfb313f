//! Subscription definitions — what a client asks to be called with.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use subclock_core::{Result, SubClockError};

/// Unit of a client-requested delivery frequency.
///
/// On the wire this is an integer: `0` seconds, `1` minutes, `2` hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum IntervalUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl IntervalUnit {
    /// Milliseconds in one unit.
    pub fn millis(self) -> u64 {
        match self {
            IntervalUnit::Seconds => 1_000,
            IntervalUnit::Minutes => 60_000,
            IntervalUnit::Hours => 3_600_000,
        }
    }
}

impl TryFrom<i64> for IntervalUnit {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(IntervalUnit::Seconds),
            1 => Ok(IntervalUnit::Minutes),
            2 => Ok(IntervalUnit::Hours),
            other => Err(format!("unknown interval unit: {other}")),
        }
    }
}

impl From<IntervalUnit> for i64 {
    fn from(unit: IntervalUnit) -> Self {
        match unit {
            IntervalUnit::Seconds => 0,
            IntervalUnit::Minutes => 1,
            IntervalUnit::Hours => 2,
        }
    }
}

impl std::fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalUnit::Seconds => write!(f, "seconds"),
            IntervalUnit::Minutes => write!(f, "minutes"),
            IntervalUnit::Hours => write!(f, "hours"),
        }
    }
}

/// Immutable configuration of one subscription.
///
/// The callback address is the subscription's identity: two configs with the
/// same address (exact, case-sensitive) describe the same subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    callback_address: String,
    interval: Duration,
}

impl SubscriptionConfig {
    /// Create a config firing every `interval`. A zero interval is rejected.
    pub fn new(callback_address: impl Into<String>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(SubClockError::InvalidInterval(
                "interval must be greater than zero".into(),
            ));
        }
        Ok(Self {
            callback_address: callback_address.into(),
            interval,
        })
    }

    /// Create a config from a client `(interval, unit)` pair.
    pub fn from_frequency(
        callback_address: impl Into<String>,
        interval: u64,
        unit: IntervalUnit,
    ) -> Result<Self> {
        let millis = interval.checked_mul(unit.millis()).ok_or_else(|| {
            SubClockError::InvalidInterval(format!("{interval} {unit} overflows"))
        })?;
        Self::new(callback_address, Duration::from_millis(millis))
    }

    pub fn callback_address(&self) -> &str {
        &self.callback_address
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn interval_millis(&self) -> u64 {
        self.interval.as_millis() as u64
    }
}
