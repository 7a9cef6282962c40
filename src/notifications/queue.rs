use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::types::{Notification, Severity};
use crate::ids::MonotonicIds;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 5;
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

struct QueueState {
    /// Most recent first
    items: VecDeque<Notification>,
    /// Pending expiry task per notification id
    timers: HashMap<u64, AbortHandle>,
}

/// Bounded, self-expiring feed of status messages.
///
/// Cloning yields another handle to the same queue. Each pushed
/// notification gets an expiry task that removes it by id after the
/// configured delay; expiry and [`dismiss`](Self::dismiss) share the same
/// removal path and are no-ops once the id is gone.
#[derive(Clone)]
pub struct NotificationQueue {
    state: Arc<Mutex<QueueState>>,
    ids: Arc<MonotonicIds>,
    capacity: usize,
    ttl: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationQueue {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                items: VecDeque::new(),
                timers: HashMap::new(),
            })),
            ids: Arc::new(MonotonicIds::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn lock(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
        state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a notification at the head and schedule its expiry.
    /// Returns the new notification's id.
    ///
    /// Outside a Tokio runtime no expiry is scheduled; the notification then
    /// leaves only through overflow or [`dismiss`](Self::dismiss).
    pub fn push(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let notification = Notification::new(self.ids.next(), message.into(), severity);
        let id = notification.id;
        debug!("Notification {} ({}): {}", id, severity, notification.message);

        {
            let mut state = Self::lock(&self.state);
            state.items.push_front(notification);
            while state.items.len() > self.capacity {
                if let Some(evicted) = state.items.pop_back() {
                    if let Some(timer) = state.timers.remove(&evicted.id) {
                        timer.abort();
                    }
                    debug!("Evicted notification {} on overflow", evicted.id);
                }
            }
        }

        self.schedule_expiry(id);
        id
    }

    fn schedule_expiry(&self, id: u64) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime, notification {} will not expire", id);
                return;
            }
        };

        let weak: Weak<Mutex<QueueState>> = Arc::downgrade(&self.state);
        // Deadline is fixed at creation, not when the task first runs
        let deadline = tokio::time::Instant::now() + self.ttl;
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(state) = weak.upgrade() {
                if Self::remove(&state, id) {
                    debug!("Notification {} expired", id);
                }
            }
        });

        let mut state = Self::lock(&self.state);
        if state.items.iter().any(|n| n.id == id) {
            state.timers.insert(id, task.abort_handle());
        } else {
            task.abort();
        }
    }

    /// Shared removal path. Returns whether the id was present.
    fn remove(state: &Mutex<QueueState>, id: u64) -> bool {
        let mut state = Self::lock(state);
        state.timers.remove(&id);
        let before = state.items.len();
        state.items.retain(|n| n.id != id);
        state.items.len() != before
    }

    /// Remove a notification now and cancel its expiry task.
    /// Returns false when the id is no longer active.
    pub fn dismiss(&self, id: u64) -> bool {
        if let Some(timer) = Self::lock(&self.state).timers.get(&id) {
            timer.abort();
        }
        Self::remove(&self.state, id)
    }

    /// Active notifications, most recent first.
    pub fn active(&self) -> Vec<Notification> {
        Self::lock(&self.state).items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        Self::lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        Self::lock(&self.state).timers.len()
    }
}
