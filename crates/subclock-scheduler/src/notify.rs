//! Outbound notification — the call a subscription makes on every tick.
//!
//! The scheduler only sees the [`Notifier`] trait. [`HttpNotifier`] is the
//! production implementation: a JSON POST to the callback address.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use subclock_core::{NotifierConfig, SubClockError};
use thiserror::Error;

/// Why a notification did not reach the subscriber.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request to {address} failed: {source}")]
    Transport {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{address} responded with {status}")]
    Status {
        address: String,
        status: reqwest::StatusCode,
    },

    #[error("{0}")]
    Other(String),
}

/// Delivers one notification to a subscriber.
///
/// Implementations may take arbitrarily long; the calling subscription is
/// paused for as long as the call is outstanding.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, address: &str, fired_at: DateTime<Utc>) -> Result<(), NotifyError>;
}

/// JSON body POSTed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "notificationTime")]
    pub notification_time: DateTime<Utc>,
}

/// HTTP notifier — POSTs `{"notificationTime": ...}` to the callback address.
pub struct HttpNotifier {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpNotifier {
    /// Build a notifier with its own connection pool.
    pub fn new(config: &NotifierConfig) -> subclock_core::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SubClockError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.timeout()))
    }

    pub fn with_client(client: reqwest::Client, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, address: &str, fired_at: DateTime<Utc>) -> Result<(), NotifyError> {
        tracing::debug!("⏰ It's {}, time to call {}", fired_at.to_rfc3339(), address);

        let payload = NotificationPayload {
            notification_time: fired_at,
        };
        let mut req = self.client.post(address).json(&payload);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await.map_err(|source| NotifyError::Transport {
            address: address.to_string(),
            source,
        })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!("Response from {}: {} {}", address, status, body);

        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                address: address.to_string(),
                status,
            })
        }
    }
}
