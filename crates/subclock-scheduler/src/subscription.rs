//! Scheduled subscription — one callback URL, one periodic trigger.
//!
//! Each started subscription owns a tokio task that is the only writer of its
//! trigger state. State transitions:
//!
//! ```text
//! Created ──start──▶ Armed ──tick while a call is in flight──▶ Paused
//!                      ▲                                         │
//!                      └──────────── in-flight call returns ─────┘
//! any ──stop / last handle dropped──▶ Stopped (terminal)
//! ```
//!
//! A tick that lands while the previous notification is still outstanding is
//! dropped, never queued. The trigger then stays silent until the call
//! returns, and the next tick comes one full interval later.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::model::SubscriptionConfig;
use crate::notify::Notifier;

/// Where a subscription's trigger is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    /// Constructed, never started.
    Created,
    /// Ticking on its interval.
    Armed,
    /// Silenced until the in-flight notification returns.
    Paused,
    /// Cancelled for good.
    Stopped,
}

/// Observable runtime state of a subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    pub state: TriggerState,
    /// A notification for this subscription is in flight.
    pub running: bool,
    /// Completed notification calls, successful or not.
    pub dispatched: u64,
    /// Ticks dropped because a call was still in flight.
    pub skipped: u64,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl SubscriptionStatus {
    fn new() -> Self {
        Self {
            state: TriggerState::Created,
            running: false,
            dispatched: 0,
            skipped: 0,
            last_notified_at: None,
        }
    }

    pub fn armed(&self) -> bool {
        self.state == TriggerState::Armed
    }
}

/// Serializable view of a subscription for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSnapshot {
    pub id: Uuid,
    pub callback_address: String,
    pub interval_millis: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: SubscriptionStatus,
}

enum Lifecycle {
    Created,
    /// Dropping the guard cancels the trigger task.
    Started(DropGuard),
    Stopped,
}

/// A registered callback URL and its trigger.
pub struct ScheduledSubscription {
    id: Uuid,
    config: SubscriptionConfig,
    notifier: Arc<dyn Notifier>,
    status: Arc<watch::Sender<SubscriptionStatus>>,
    lifecycle: Mutex<Lifecycle>,
    created_at: DateTime<Utc>,
}

impl ScheduledSubscription {
    /// Create a subscription in the `Created` state. Nothing ticks until
    /// [`start`](Self::start) is called.
    pub fn new(config: SubscriptionConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (status, _) = watch::channel(SubscriptionStatus::new());
        Self {
            id: Uuid::new_v4(),
            config,
            notifier,
            status: Arc::new(status),
            lifecycle: Mutex::new(Lifecycle::Created),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    pub fn callback_address(&self) -> &str {
        self.config.callback_address()
    }

    /// Arm the trigger. Idempotent; a stopped subscription stays stopped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        match *lifecycle {
            Lifecycle::Started(_) => return,
            Lifecycle::Stopped => {
                tracing::debug!("Ignoring start of stopped subscription {}", self.callback_address());
                return;
            }
            Lifecycle::Created => {}
        }

        let cancel = CancellationToken::new();
        self.status.send_modify(|s| s.state = TriggerState::Armed);
        let trigger = Trigger {
            address: self.config.callback_address().to_string(),
            period: self.config.interval(),
            notifier: self.notifier.clone(),
            status: self.status.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(trigger.run());
        *lifecycle = Lifecycle::Started(cancel.drop_guard());

        tracing::info!(
            "🔔 Trigger armed for {} (every {}ms)",
            self.callback_address(),
            self.config.interval_millis()
        );
    }

    /// Disarm the trigger for good. Idempotent.
    ///
    /// A notification already in flight runs to completion, but the trigger
    /// never fires or re-arms afterwards.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped);
        if matches!(previous, Lifecycle::Stopped) {
            return;
        }
        // Cancel before publishing Stopped so the trigger cannot re-arm in between.
        drop(previous);
        self.status.send_modify(|s| s.state = TriggerState::Stopped);
        tracing::info!("🔕 Trigger stopped for {}", self.callback_address());
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes, e.g. to wait for the next dispatch.
    pub fn watch(&self) -> watch::Receiver<SubscriptionStatus> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            id: self.id,
            callback_address: self.config.callback_address().to_string(),
            interval_millis: self.config.interval_millis(),
            created_at: self.created_at,
            status: self.status(),
        }
    }
}

impl std::fmt::Debug for ScheduledSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledSubscription")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

/// Everything the trigger task needs; holds no reference back to the
/// subscription so dropping the subscription cancels the task.
struct Trigger {
    address: String,
    period: std::time::Duration,
    notifier: Arc<dyn Notifier>,
    status: Arc<watch::Sender<SubscriptionStatus>>,
    cancel: CancellationToken,
}

impl Trigger {
    async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let fired_at = Utc::now();
            self.status.send_modify(|s| s.running = true);
            tracing::debug!("Dispatching notification to {}", self.address);

            let dispatch = self.notifier.notify(&self.address, fired_at);
            tokio::pin!(dispatch);
            let mut paused = false;

            let outcome = loop {
                tokio::select! {
                    outcome = &mut dispatch => break outcome,
                    _ = ticker.tick(), if !paused => {
                        paused = true;
                        self.status.send_modify(|s| {
                            s.skipped += 1;
                            if s.state == TriggerState::Armed {
                                s.state = TriggerState::Paused;
                            }
                        });
                        tracing::debug!("⏸️ {} still in flight, pausing trigger", self.address);
                    }
                }
            };

            if let Err(e) = outcome {
                tracing::warn!("⚠️ Notification to {} failed: {e}", self.address);
            }
            self.status.send_modify(|s| {
                s.running = false;
                s.dispatched += 1;
                s.last_notified_at = Some(fired_at);
            });

            if self.cancel.is_cancelled() {
                break;
            }
            if paused {
                ticker.reset();
                self.status.send_if_modified(|s| {
                    let resume = s.state == TriggerState::Paused;
                    if resume {
                        s.state = TriggerState::Armed;
                    }
                    resume
                });
                tracing::debug!("▶️ {} answered, trigger re-armed", self.address);
            }
        }

        tracing::debug!("Trigger task for {} exited", self.address);
    }
}
