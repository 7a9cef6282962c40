pub mod config;
pub mod error;
pub mod features;
pub mod history;
mod ids;
pub mod impact;
pub mod notifications;
pub mod orchestrator;
pub mod risk;
pub mod service;
pub mod storage;

use anyhow::Context;

pub use config::AppConfig;
pub use error::{CardioRiskError, Result};
pub use features::FeatureVector;
pub use history::{HistoryEntry, PredictionHistory};
pub use notifications::{Notification, NotificationQueue, Severity};
pub use orchestrator::{ExportArtifact, PredictionOrchestrator, SessionSnapshot, SubmitOutcome, WorkflowState};
pub use risk::{classify, RiskCategory};
pub use service::{HttpPredictionService, PredictionService};

/// Install the fmt subscriber on stderr. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Wire an orchestrator against the HTTP service and the configured store,
/// loading persisted history.
pub fn build_orchestrator(
    config: &AppConfig,
) -> anyhow::Result<PredictionOrchestrator<HttpPredictionService>> {
    let service = HttpPredictionService::new(&config.service.base_url, config.request_timeout())
        .context("Failed to create prediction service client")?;
    let store = config.open_store()?;
    let history = PredictionHistory::open(store, config.history.capacity);
    let notifications =
        NotificationQueue::new(config.notifications.capacity, config.notification_ttl());

    Ok(PredictionOrchestrator::new(
        service,
        history,
        notifications,
        config.request_timeout(),
    ))
}
