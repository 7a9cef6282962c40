//! TOML configuration.
//!
//! Every field has a default, so an empty or partial file is valid:
//!
//! ```toml
//! [service]
//! base_url = "http://127.0.0.1:8000"
//! request_timeout_secs = 30
//!
//! [history]
//! capacity = 10
//! backend = "json"
//!
//! [notifications]
//! capacity = 5
//! ttl_secs = 5
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::notifications::{DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_NOTIFICATION_TTL};
use crate::storage::{JsonFileStore, KeyValueStore, SqliteStore};

const APP_DIR_NAME: &str = "cardiorisk";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub history: HistoryConfig,
    pub notifications: NotificationConfig,
    /// Where exports are written. Defaults to the user's download directory.
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// Upper bound for one full predict + explain round trip
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    pub backend: StorageBackend,
    /// Store location; derived from the data directory when unset
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            backend: StorageBackend::Json,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_NOTIFICATION_CAPACITY,
            ttl_secs: DEFAULT_NOTIFICATION_TTL.as_secs(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Invalid configuration TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or return defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {:?}", path))?;
                let config = Self::from_toml(&content)
                    .with_context(|| format!("Failed to load config from {:?}", path))?;
                info!("Loaded configuration from {:?}", path);
                Ok(config)
            }
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.service.base_url)
            .with_context(|| format!("Invalid service base_url '{}'", self.service.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("service base_url must be http or https, got '{}'", url.scheme());
        }
        if self.service.request_timeout_secs == 0 {
            bail!("service.request_timeout_secs must be greater than 0");
        }
        if self.history.capacity == 0 {
            bail!("history.capacity must be greater than 0");
        }
        if self.notifications.capacity == 0 {
            bail!("notifications.capacity must be greater than 0");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notifications.ttl_secs)
    }

    /// Resolved location of the history store file.
    pub fn history_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history.path {
            return Ok(path.clone());
        }
        let file = match self.history.backend {
            StorageBackend::Json => "store.json",
            StorageBackend::Sqlite => "store.db",
        };
        Ok(data_dir()?.join(file))
    }

    /// Resolved export directory: configured value, then the download
    /// directory, then the data directory.
    pub fn export_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.export_dir {
            return Ok(dir.clone());
        }
        match dirs::download_dir() {
            Some(dir) => Ok(dir),
            None => data_dir(),
        }
    }

    /// Open the configured key-value store.
    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        let path = self.history_path()?;
        let store: Arc<dyn KeyValueStore> = match self.history.backend {
            StorageBackend::Json => Arc::new(
                JsonFileStore::open(&path)
                    .with_context(|| format!("Failed to open JSON store at {:?}", path))?,
            ),
            StorageBackend::Sqlite => Arc::new(
                SqliteStore::open(&path)
                    .with_context(|| format!("Failed to open SQLite store at {:?}", path))?,
            ),
        };
        Ok(store)
    }
}

/// Per-user application data directory.
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .context("Could not determine the user data directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.history.capacity, 10);
        assert_eq!(config.history.backend, StorageBackend::Json);
        assert_eq!(config.notifications.capacity, 5);
        assert_eq!(config.notification_ttl(), Duration::from_secs(5));
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_partial_document() {
        let config = AppConfig::from_toml(
            r#"
            export_dir = "/tmp/exports"

            [service]
            base_url = "https://risk.example.org/api"

            [history]
            backend = "sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(config.service.base_url, "https://risk.example.org/api");
        assert_eq!(config.service.request_timeout_secs, 30);
        assert_eq!(config.history.backend, StorageBackend::Sqlite);
        assert_eq!(config.history.capacity, 10);
        assert_eq!(config.export_dir().unwrap(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(AppConfig::from_toml("[service]\nbase_url = \"nope\"").is_err());
        assert!(AppConfig::from_toml("[service]\nbase_url = \"ftp://x.org\"").is_err());
        assert!(AppConfig::from_toml("[service]\nrequest_timeout_secs = 0").is_err());
        assert!(AppConfig::from_toml("[history]\ncapacity = 0").is_err());
        assert!(AppConfig::from_toml("[notifications]\ncapacity = 0").is_err());
        assert!(AppConfig::from_toml("[history]\nbackend = \"redis\"").is_err());
    }

    #[test]
    fn test_explicit_history_path_opens_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        let config = AppConfig::from_toml(&format!(
            "[history]\nbackend = \"sqlite\"\npath = {:?}\n",
            path.to_string_lossy()
        ))
        .unwrap();

        assert_eq!(config.history_path().unwrap(), path);
        let store = config.open_store().unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
        assert!(AppConfig::load(None).is_ok());
    }
}
