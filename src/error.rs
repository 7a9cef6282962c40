use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardioRiskError {
    /// Transport failure, non-success status or undecodable body from the service.
    #[error("Remote call to {endpoint} failed: {message}")]
    RemoteCall { endpoint: String, message: String },

    #[error("Prediction round trip timed out after {0:?}")]
    Timeout(Duration),

    #[error("No active prediction result to export")]
    NoActiveResult,

    #[error("History entry not found: {0}")]
    EntryNotFound(u64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardioRiskError {
    pub(crate) fn remote(endpoint: &str, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// True for failures of the remote round trip (including timeouts).
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteCall { .. } | Self::Timeout(_))
    }
}

impl From<CardioRiskError> for String {
    fn from(err: CardioRiskError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, CardioRiskError>;
