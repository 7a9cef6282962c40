use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::service::PredictionResult;

/// One completed prediction round trip.
///
/// Serialized as `{ id, timestamp, result, probability, prediction?, formData }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    /// Local creation time, for display
    pub timestamp: String,
    #[serde(flatten)]
    pub prediction: PredictionResult,
    /// Copy of the inputs the prediction was made for
    #[serde(rename = "formData")]
    pub features: FeatureVector,
}

impl HistoryEntry {
    pub fn new(id: u64, prediction: PredictionResult, features: FeatureVector) -> Self {
        Self {
            id,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            prediction,
            features,
        }
    }

    pub fn probability(&self) -> f64 {
        self.prediction.probability
    }
}

/// Aggregate statistics over the stored history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryInsights {
    pub total: usize,
    pub low_risk: usize,
    pub moderate_risk: usize,
    pub high_risk: usize,
    pub average_probability: f64,
    pub max_probability: f64,
    pub min_probability: f64,
}
