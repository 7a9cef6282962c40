use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use super::session::SessionSnapshot;
use crate::error::{CardioRiskError, Result};
use crate::features::FeatureVector;
use crate::service::FeatureImpact;

/// Downloadable snapshot of the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub result: String,
    pub probability: f64,
    pub shap_values: Vec<FeatureImpact>,
    #[serde(rename = "formData")]
    pub form_data: FeatureVector,
}

impl ExportArtifact {
    /// Build the artifact from a session snapshot.
    /// Fails with `NoActiveResult` when nothing has been predicted yet.
    pub fn from_session(session: &SessionSnapshot) -> Result<Self> {
        let (prediction, features) = match (&session.prediction, &session.features) {
            (Some(p), Some(f)) => (p, f),
            _ => return Err(CardioRiskError::NoActiveResult),
        };

        Ok(Self {
            result: prediction.result.clone(),
            probability: prediction.probability,
            shap_values: session.impacts.clone(),
            form_data: features.clone(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `heart-risk-prediction-<unix millis>.json`
    pub fn file_name() -> String {
        format!("heart-risk-prediction-{}.json", Utc::now().timestamp_millis())
    }

    /// Write the artifact into `dir` atomically and return its path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let target = dir.join(Self::file_name());
        let json = self.to_json_pretty()?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(&target)
            .map_err(|e| CardioRiskError::Storage(format!("Failed to write {:?}: {}", target, e)))?;

        info!("Exported prediction to {:?}", target);
        Ok(target)
    }
}
