use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Generator of creation-time identifiers.
///
/// Each id is the current Unix time in milliseconds, bumped past the last id
/// handed out, so ids stay unique and increasing even when several are
/// requested within the same millisecond.
#[derive(Debug, Default)]
pub struct MonotonicIds {
    last: AtomicU64,
}

impl MonotonicIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Make sure future ids are greater than `id` (used after loading
    /// persisted records).
    pub fn observe(&self, id: u64) {
        self.last.fetch_max(id, Ordering::Relaxed);
    }
}
