pub mod store;
pub mod types;

pub use store::{PredictionHistory, DEFAULT_HISTORY_CAPACITY, HISTORY_KEY};
pub use types::{HistoryEntry, HistoryInsights};
