//! # SubClock Scheduler
//!
//! Keeps one autonomous timer per subscribed callback URL and calls the
//! subscriber on every tick, forever, until it is deregistered.
//!
//! ## Architecture
//! ```text
//! Scheduler (register / update / unregister)
//!   └── Registry: callback URL → ScheduledSubscription (at most one per URL)
//!         └── trigger task (tokio interval, one per subscription)
//!               ├── Armed:   tick → Notifier::notify(url, fired_at)
//!               ├── Paused:  a tick arrived while the previous call was in flight
//!               └── Stopped: cancelled, never fires again
//! ```
//!
//! A subscriber slower than its own interval never receives overlapping
//! calls: the overlapping tick is dropped and the trigger re-arms once the
//! outstanding call returns.

pub mod engine;
pub mod model;
pub mod notify;
pub mod registry;
pub mod subscription;

#[cfg(test)]
mod test_support;

pub use engine::{Outcome, Scheduler};
pub use model::{IntervalUnit, SubscriptionConfig};
pub use notify::{HttpNotifier, NotificationPayload, Notifier, NotifyError};
pub use registry::Registry;
pub use subscription::{ScheduledSubscription, SubscriptionSnapshot, SubscriptionStatus, TriggerState};
