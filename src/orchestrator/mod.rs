//! Prediction workflow: sequences `/predict` then `/explain`, owns the
//! session state and fans results out into history and notifications.
//!
//! Flow of one submission:
//!
//! 1. Snapshot the feature vector and open a new request epoch
//! 2. `/predict`, then `/explain` for the same snapshot (bounded by the
//!    request timeout)
//! 3. Drop the outcome if a newer epoch has started
//! 4. On success commit session, append history, push a success notification
//! 5. On failure keep the prior session, push an error notification

pub mod export;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{CardioRiskError, Result};
use crate::features::{validate_features, FeatureVector};
use crate::history::{HistoryEntry, HistoryInsights, PredictionHistory};
use crate::notifications::{NotificationQueue, Severity};
use crate::service::PredictionService;

pub use export::ExportArtifact;
pub use session::{SessionSnapshot, WorkflowState};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MSG_PREDICTION_OK: &str = "Prediction completed successfully!";
const MSG_PREDICTION_FAILED: &str = "Failed to connect to the server";
const MSG_EXPORT_OK: &str = "Data exported successfully!";
const MSG_HISTORY_CLEARED: &str = "History cleared";
const MSG_HISTORY_CLEAR_FAILED: &str = "Failed to clear saved history";

/// Result of a submission that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Both calls succeeded and the session now shows this entry
    Completed(HistoryEntry),
    /// A newer submission started before this one resolved; its response
    /// was discarded
    Superseded,
}

pub struct PredictionOrchestrator<S> {
    service: S,
    session: Mutex<session::Session>,
    history: Mutex<PredictionHistory>,
    notifications: NotificationQueue,
    request_timeout: Duration,
}

impl<S: PredictionService> PredictionOrchestrator<S> {
    pub fn new(
        service: S,
        history: PredictionHistory,
        notifications: NotificationQueue,
        request_timeout: Duration,
    ) -> Self {
        Self {
            service,
            session: Mutex::new(session::Session::default()),
            history: Mutex::new(history),
            notifications,
            request_timeout,
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, session::Session> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_history(&self) -> MutexGuard<'_, PredictionHistory> {
        self.history.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Run one prediction round trip for `features`.
    ///
    /// Callers should not resubmit while [`is_submitting`](Self::is_submitting);
    /// if they do, only the latest submission may change the session.
    /// Remote failures (including timeouts) are returned after the session
    /// moves to `Failed` and an error notification is pushed.
    pub async fn submit(&self, features: &FeatureVector) -> Result<SubmitOutcome> {
        let snapshot = features.clone();
        for w in validate_features(&snapshot) {
            warn!("Feature validation warning: {} (field: {}, value: {})", w.message, w.field, w.value);
        }

        let epoch = self.lock_session().begin();
        info!("Submitting prediction request (epoch {})", epoch);

        let round_trip = async {
            let prediction = self.service.predict(&snapshot).await?;
            debug!("Prediction received (epoch {}): p={:.4}", epoch, prediction.probability);
            let explanation = self.service.explain(&snapshot).await?;
            debug!(
                "Explanation received (epoch {}): {} impacts",
                epoch,
                explanation.shap_values.len()
            );
            Ok::<_, CardioRiskError>((prediction, explanation))
        };

        let outcome = match tokio::time::timeout(self.request_timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(CardioRiskError::Timeout(self.request_timeout)),
        };

        match outcome {
            Ok((prediction, explanation)) => {
                let committed = self.lock_session().complete(
                    epoch,
                    prediction.clone(),
                    explanation,
                    snapshot.clone(),
                );
                if !committed {
                    info!("Discarding response for superseded epoch {}", epoch);
                    return Ok(SubmitOutcome::Superseded);
                }

                let entry = {
                    let mut history = self.lock_history();
                    let entry = HistoryEntry::new(history.next_id(), prediction, snapshot);
                    if let Err(e) = history.append(entry.clone()) {
                        warn!("Prediction {} kept in memory only: {}", entry.id, e);
                    }
                    entry
                };

                info!(
                    "Prediction completed (epoch {}): {} p={:.4}",
                    epoch, entry.prediction.result, entry.prediction.probability
                );
                self.notifications.push(MSG_PREDICTION_OK, Severity::Success);
                Ok(SubmitOutcome::Completed(entry))
            }
            Err(e) => {
                if !self.lock_session().fail(epoch) {
                    info!("Discarding failure for superseded epoch {}: {}", epoch, e);
                    return Ok(SubmitOutcome::Superseded);
                }
                error!("Prediction failed (epoch {}): {}", epoch, e);
                self.notifications.push(MSG_PREDICTION_FAILED, Severity::Error);
                Err(e)
            }
        }
    }

    pub fn session(&self) -> SessionSnapshot {
        self.lock_session().snapshot()
    }

    pub fn state(&self) -> WorkflowState {
        self.lock_session().state()
    }

    pub fn is_submitting(&self) -> bool {
        self.state() == WorkflowState::Submitting
    }

    /// Move `Succeeded`/`Failed` back to `Idle`.
    pub fn acknowledge(&self) {
        self.lock_session().acknowledge();
    }

    /// History entries, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_history().all().to_vec()
    }

    pub fn history_insights(&self) -> Option<HistoryInsights> {
        self.lock_history().insights()
    }

    /// Show a past entry in the session. The entry stays in history.
    pub fn replay(&self, entry_id: u64) -> Result<SessionSnapshot> {
        let entry = self
            .lock_history()
            .get(entry_id)
            .cloned()
            .ok_or(CardioRiskError::EntryNotFound(entry_id))?;

        let mut session = self.lock_session();
        session.restore(&entry);
        info!("Replayed history entry {}", entry_id);
        Ok(session.snapshot())
    }

    pub fn clear_history(&self) -> Result<()> {
        match self.lock_history().clear() {
            Ok(()) => {
                self.notifications.push(MSG_HISTORY_CLEARED, Severity::Info);
                Ok(())
            }
            Err(e) => {
                self.notifications.push(MSG_HISTORY_CLEAR_FAILED, Severity::Error);
                Err(e)
            }
        }
    }

    /// Snapshot of the current result for export.
    /// Fails with `NoActiveResult` before the first successful prediction.
    pub fn export_snapshot(&self) -> Result<ExportArtifact> {
        ExportArtifact::from_session(&self.session())
    }

    /// Write the export artifact into `dir` and return the file path.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let artifact = self.export_snapshot()?;
        let path = artifact.write_to_dir(dir)?;
        self.notifications.push(MSG_EXPORT_OK, Severity::Success);
        Ok(path)
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}
