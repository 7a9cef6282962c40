use serde::Serialize;

use crate::features::FeatureVector;
use crate::history::HistoryEntry;
use crate::risk::{classify, RiskAssessment};
use crate::service::{Explanation, FeatureImpact, PredictionResult};

/// Phase of the prediction workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WorkflowState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Read-only copy of the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: WorkflowState,
    /// Epoch of the most recent submission or replay
    pub epoch: u64,
    pub prediction: Option<PredictionResult>,
    /// Impacts in service order
    pub impacts: Vec<FeatureImpact>,
    pub base_value: Option<f64>,
    /// Inputs the shown prediction belongs to
    pub features: Option<FeatureVector>,
}

impl SessionSnapshot {
    pub fn probability(&self) -> Option<f64> {
        self.prediction.as_ref().map(|p| p.probability)
    }

    /// Risk category of the shown probability, recomputed on every call.
    pub fn risk(&self) -> Option<RiskAssessment> {
        self.probability().map(classify)
    }

    pub fn has_result(&self) -> bool {
        self.prediction.is_some()
    }
}

/// Session state owned by the orchestrator. Only the transition methods
/// below mutate it.
#[derive(Debug, Default)]
pub(crate) struct Session {
    current: SessionSnapshot,
}

impl Session {
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        self.current.clone()
    }

    pub(crate) fn state(&self) -> WorkflowState {
        self.current.state
    }

    /// Enter `Submitting` under a new epoch and return it.
    pub(crate) fn begin(&mut self) -> u64 {
        self.current.epoch += 1;
        self.current.state = WorkflowState::Submitting;
        self.current.epoch
    }

    /// Commit a completed round trip. Returns false, leaving the session
    /// untouched, when `epoch` has been superseded.
    pub(crate) fn complete(
        &mut self,
        epoch: u64,
        prediction: PredictionResult,
        explanation: Explanation,
        features: FeatureVector,
    ) -> bool {
        if epoch != self.current.epoch {
            return false;
        }
        self.current.state = WorkflowState::Succeeded;
        self.current.prediction = Some(prediction);
        self.current.impacts = explanation.shap_values;
        self.current.base_value = explanation.base_value;
        self.current.features = Some(features);
        true
    }

    /// Record a failed round trip; prior results stay in place.
    /// Returns false when `epoch` has been superseded.
    pub(crate) fn fail(&mut self, epoch: u64) -> bool {
        if epoch != self.current.epoch {
            return false;
        }
        self.current.state = WorkflowState::Failed;
        true
    }

    /// Load a history entry into the session. Supersedes any in-flight
    /// submission. Impacts are cleared since history does not keep them.
    pub(crate) fn restore(&mut self, entry: &HistoryEntry) {
        self.current.epoch += 1;
        self.current.state = WorkflowState::Idle;
        self.current.prediction = Some(entry.prediction.clone());
        self.current.impacts.clear();
        self.current.base_value = None;
        self.current.features = Some(entry.features.clone());
    }

    /// Return from a terminal state to `Idle`.
    pub(crate) fn acknowledge(&mut self) {
        if matches!(
            self.current.state,
            WorkflowState::Succeeded | WorkflowState::Failed
        ) {
            self.current.state = WorkflowState::Idle;
        }
    }
}
