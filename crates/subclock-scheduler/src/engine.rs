//! Scheduler — the only entry point the request layer talks to.
//! Pairs registry mutations with trigger start/stop.

use serde::Serialize;
use std::sync::Arc;

use crate::model::SubscriptionConfig;
use crate::notify::Notifier;
use crate::registry::Registry;
use crate::subscription::{ScheduledSubscription, SubscriptionSnapshot};

/// Result of a scheduler operation. All of these are normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A trigger is now running for the address.
    Scheduled,
    /// The address was scheduled and is no more.
    Removed,
    /// The address is already scheduled.
    Conflict,
    /// The address is not scheduled.
    NotFound,
}

/// Orchestrates subscriptions against the registry.
pub struct Scheduler {
    registry: Registry<Arc<ScheduledSubscription>>,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            registry: Registry::new(),
            notifier,
        }
    }

    /// Schedule a new subscription. Only the registration that wins the
    /// registry insert ever starts a trigger.
    pub fn register(&self, config: SubscriptionConfig) -> Outcome {
        let address = config.callback_address().to_string();
        let subscription = Arc::new(ScheduledSubscription::new(config, self.notifier.clone()));

        if self.registry.insert(address.clone(), subscription.clone()) {
            // A racing unregister may already have stopped it; start is then a no-op.
            subscription.start();
            tracing::info!(
                "📅 Subscription scheduled: {} (every {}ms)",
                address,
                subscription.config().interval_millis()
            );
            Outcome::Scheduled
        } else {
            tracing::info!("Subscription not scheduled: {} is already registered", address);
            Outcome::Conflict
        }
    }

    /// Remove a subscription and stop the trigger that was actually running.
    pub fn unregister(&self, address: &str) -> Outcome {
        match self.registry.remove(address) {
            Some(previous) => {
                previous.stop();
                tracing::info!("🗑️ Subscription removed: {}", address);
                Outcome::Removed
            }
            None => {
                tracing::info!("Subscription not removed: {} was never registered", address);
                Outcome::NotFound
            }
        }
    }

    /// Swap the schedule of an existing subscription.
    ///
    /// The new subscription replaces the old one in a single registry
    /// operation, so the address is never briefly unregistered and a racing
    /// `register` cannot slip in. Never creates a subscription.
    pub fn update(&self, config: SubscriptionConfig) -> Outcome {
        let address = config.callback_address().to_string();
        let subscription = Arc::new(ScheduledSubscription::new(config, self.notifier.clone()));

        match self.registry.replace(&address, subscription.clone()) {
            Some(previous) => {
                previous.stop();
                subscription.start();
                tracing::info!(
                    "🔄 Subscription updated: {} (every {}ms)",
                    address,
                    subscription.config().interval_millis()
                );
                Outcome::Scheduled
            }
            None => {
                tracing::info!("Subscription not updated: {} was never registered", address);
                Outcome::NotFound
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<Arc<ScheduledSubscription>> {
        self.registry.get(address)
    }

    /// Snapshot of every live subscription, ordered by callback address.
    pub fn list(&self) -> Vec<SubscriptionSnapshot> {
        let mut snapshots: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .map(|(_, sub)| sub.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.callback_address.cmp(&b.callback_address));
        snapshots
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Stop and forget every subscription. Returns how many were stopped.
    pub fn shutdown(&self) -> usize {
        let drained = self.registry.drain();
        for (_, subscription) in &drained {
            subscription.stop();
        }
        tracing::info!("⏹️ Scheduler shut down, {} subscription(s) stopped", drained.len());
        drained.len()
    }
}
