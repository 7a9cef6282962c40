use chrono::{DateTime, Local, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// A transient status message shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(id: u64, message: String, severity: Severity) -> Self {
        Self {
            id,
            message,
            severity,
            created_at: Utc::now(),
        }
    }

    /// Local wall-clock time of creation, e.g. "14:05:09".
    pub fn time_label(&self) -> String {
        self.created_at.with_timezone(&Local).format("%H:%M:%S").to_string()
    }
}
