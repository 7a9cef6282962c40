//! Remote prediction service contract and its HTTP implementation.

pub mod http_client;
pub mod types;

use std::future::Future;

use crate::error::Result;
use crate::features::FeatureVector;

pub use http_client::HttpPredictionService;
pub use types::*;

/// The remote risk-prediction service as seen by the orchestrator.
///
/// Both calls take the same feature snapshot by reference; implementations
/// must not retain it past the call.
pub trait PredictionService: Send + Sync {
    /// `POST /predict`
    fn predict(
        &self,
        features: &FeatureVector,
    ) -> impl Future<Output = Result<PredictionResult>> + Send;

    /// `POST /explain`
    fn explain(&self, features: &FeatureVector) -> impl Future<Output = Result<Explanation>> + Send;

    /// `GET /`
    fn health(&self) -> impl Future<Output = Result<HealthStatus>> + Send;
}
