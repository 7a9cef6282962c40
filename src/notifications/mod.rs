//! Transient notification feed.

pub mod queue;
pub mod types;

pub use queue::{NotificationQueue, DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_NOTIFICATION_TTL};
pub use types::{Notification, Severity};
