use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{HistoryEntry, HistoryInsights};
use crate::error::Result;
use crate::ids::MonotonicIds;
use crate::risk::RiskCategory;
use crate::storage::KeyValueStore;

/// Key under which the serialized history lives in the key-value store.
pub const HISTORY_KEY: &str = "predictionHistory";

/// Number of entries kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Ids are Unix milliseconds; anything above this cannot come from the
/// clock and would leave no room for later ids.
const MAX_PLAUSIBLE_ID: u64 = i64::MAX as u64;

/// Bounded, most-recent-first log of completed predictions.
///
/// Every mutation rewrites the full snapshot under [`HISTORY_KEY`].
pub struct PredictionHistory {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
    capacity: usize,
    ids: MonotonicIds,
}

impl PredictionHistory {
    /// Create an empty history over `store`. Call [`load`](Self::load) to
    /// restore the persisted snapshot.
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            entries: Vec::new(),
            capacity: capacity.max(1),
            ids: MonotonicIds::new(),
        }
    }

    /// Create and immediately load.
    pub fn open(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let mut history = Self::new(store, capacity);
        history.load();
        history
    }

    /// Replace the in-memory sequence with the persisted snapshot.
    /// Absent, unreadable or malformed data yields an empty history.
    pub fn load(&mut self) {
        self.entries = match self.store.get(HISTORY_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<HistoryEntry>>(&json) {
                Ok(mut entries) => {
                    let before = entries.len();
                    entries.retain(|e| e.id <= MAX_PLAUSIBLE_ID);
                    if entries.len() != before {
                        warn!(
                            "Dropped {} persisted history entries with out-of-range ids",
                            before - entries.len()
                        );
                    }
                    entries.truncate(self.capacity);
                    entries
                }
                Err(e) => {
                    warn!("Persisted history is malformed, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read persisted history, starting empty: {}", e);
                Vec::new()
            }
        };

        for entry in &self.entries {
            self.ids.observe(entry.id);
        }
        info!("Loaded {} history entries", self.entries.len());
    }

    /// Fresh entry id, greater than any id already in the history.
    pub fn next_id(&self) -> u64 {
        self.ids.next()
    }

    /// Insert at the head, evict beyond capacity and persist.
    ///
    /// The in-memory sequence is updated even when the write fails; the
    /// error is returned so the caller can report it.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.ids.observe(entry.id);
        self.entries.insert(0, entry);
        if self.entries.len() > self.capacity {
            let evicted = self.entries.len() - self.capacity;
            self.entries.truncate(self.capacity);
            debug!("Evicted {} oldest history entries", evicted);
        }
        self.persist()
    }

    /// Remove the persisted snapshot, then empty the history. Idempotent.
    ///
    /// When the removal fails the in-memory entries are kept, so memory
    /// never disagrees with what the next load would restore.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(HISTORY_KEY).map_err(|e| {
            warn!("Failed to remove persisted history: {}", e);
            e
        })?;
        self.entries.clear();
        info!("Cleared prediction history");
        Ok(())
    }

    /// All entries, most recent first.
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Risk distribution and probability statistics. `None` when empty.
    pub fn insights(&self) -> Option<HistoryInsights> {
        if self.entries.is_empty() {
            return None;
        }

        let mut insights = HistoryInsights {
            total: self.entries.len(),
            low_risk: 0,
            moderate_risk: 0,
            high_risk: 0,
            average_probability: 0.0,
            max_probability: f64::MIN,
            min_probability: f64::MAX,
        };

        let mut sum = 0.0;
        for entry in &self.entries {
            let p = entry.probability();
            match RiskCategory::from_probability(p) {
                RiskCategory::Low => insights.low_risk += 1,
                RiskCategory::Moderate => insights.moderate_risk += 1,
                RiskCategory::High => insights.high_risk += 1,
            }
            sum += p;
            insights.max_probability = insights.max_probability.max(p);
            insights.min_probability = insights.min_probability.min(p);
        }
        insights.average_probability = sum / self.entries.len() as f64;

        Some(insights)
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        self.store.set(HISTORY_KEY, &json).map_err(|e| {
            warn!("Failed to persist history: {}", e);
            e
        })
    }
}
