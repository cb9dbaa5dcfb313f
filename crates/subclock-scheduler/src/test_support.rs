//! Notifier doubles shared by the scheduler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::notify::{Notifier, NotifyError};

/// Counts calls and records addresses; optionally sleeps before returning.
#[derive(Default)]
pub struct CountingNotifier {
    calls: AtomicU64,
    delay: Duration,
    addresses: Mutex<Vec<String>>,
}

impl CountingNotifier {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify(&self, address: &str, _fired_at: DateTime<Utc>) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().unwrap().push(address.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

/// Blocks every call until the test hands out a permit.
pub struct GatedNotifier {
    calls: AtomicU64,
    gate: Semaphore,
}

impl Default for GatedNotifier {
    fn default() -> Self {
        Self {
            calls: AtomicU64::new(0),
            gate: Semaphore::new(0),
        }
    }
}

impl GatedNotifier {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Let `n` pending or future calls return.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl Notifier for GatedNotifier {
    async fn notify(&self, _address: &str, _fired_at: DateTime<Utc>) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        Ok(())
    }
}

/// Always fails.
#[derive(Default)]
pub struct FailingNotifier {
    calls: AtomicU64,
}

impl FailingNotifier {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, address: &str, _fired_at: DateTime<Utc>) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Other(format!("{address} is down")))
    }
}
