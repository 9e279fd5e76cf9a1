//! Configuration management for the check-in desk.
//!
//! Two layers:
//! - [`AppSettings`]: process settings read from environment variables once at startup
//! - [`Configuration`]: the user-editable record (base URL, credential, reward
//!   defaults) persisted by a [`SettingsStore`], here a JSON key/value file

use async_trait::async_trait;
use reception_core::model::Configuration;
use reception_core::storage::{CONFIG_KEY, SettingsStore, StorageError};
use serde_json::{Map, Value};
use std::env;
use std::path::{Path, PathBuf};

/// Process settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// JSON file holding persisted client state
    pub storage_path: PathBuf,
    /// Device paths offered to the line scanner
    pub scanner_devices: Vec<String>,
    /// Configuration used when nothing has been persisted yet
    pub seed: Configuration,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl AppSettings {
    /// Load settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("RECEPTION_API_URL").unwrap_or_default();
        let api_key = lookup("RECEPTION_API_KEY").unwrap_or_default();
        let default_score = lookup("RECEPTION_DEFAULT_SCORE")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let default_coin = lookup("RECEPTION_DEFAULT_COIN")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        Self {
            storage_path: lookup("RECEPTION_STORAGE_PATH")
                .map_or_else(|| PathBuf::from("reception.json"), PathBuf::from),
            scanner_devices: lookup("RECEPTION_SCANNER_DEVICES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            seed: Configuration::new(&api_url, &api_key)
                .with_reward_defaults(default_score, default_coin),
            log_filter: lookup("RECEPTION_LOG")
                .unwrap_or_else(|| "checkin=info,reception_runtime=info".to_string()),
        }
    }
}

/// Load the persisted configuration, falling back to `seed`.
///
/// A corrupt record is logged and ignored rather than aborting startup.
pub async fn load_configuration(store: &dyn SettingsStore, seed: &Configuration) -> Configuration {
    match store.load().await {
        Ok(Some(configuration)) => {
            tracing::info!(api_url = %configuration.api_url, "Configuration loaded");
            configuration
        },
        Ok(None) => {
            tracing::info!("No stored configuration, using environment seed");
            seed.clone()
        },
        Err(error) => {
            tracing::error!(%error, "Failed to parse stored configuration");
            seed.clone()
        },
    }
}

/// [`SettingsStore`] backed by a JSON object file, one entry per storage key.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(error.into()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(StorageError::Corrupt("storage root is not an object".to_string())),
            Err(error) => Err(StorageError::Corrupt(error.to_string())),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<Configuration>, StorageError> {
        let mut entries = self.read_entries().await?;
        entries
            .remove(CONFIG_KEY)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| StorageError::Corrupt(e.to_string()))
            })
            .transpose()
    }

    async fn save(&self, configuration: &Configuration) -> Result<(), StorageError> {
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(%reason, path = %self.path.display(), "Overwriting corrupt storage file");
                Map::new()
            },
            Err(error) => return Err(error),
        };

        let record =
            serde_json::to_value(configuration).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        entries.insert(CONFIG_KEY.to_string(), record);

        let body = serde_json::to_vec_pretty(&Value::Object(entries))
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Configuration persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = AppSettings::from_lookup(|_| None);
        assert_eq!(settings.storage_path, PathBuf::from("reception.json"));
        assert!(settings.scanner_devices.is_empty());
        assert!(!settings.seed.is_complete());
    }

    #[test]
    fn test_environment_seed_and_devices() {
        let settings = AppSettings::from_lookup(lookup(&[
            ("RECEPTION_API_URL", "https://api.test/"),
            ("RECEPTION_API_KEY", "secret"),
            ("RECEPTION_DEFAULT_SCORE", "50"),
            ("RECEPTION_DEFAULT_COIN", "oops"),
            ("RECEPTION_SCANNER_DEVICES", "/dev/ttyACM0, ,/tmp/scanner"),
        ]));
        assert_eq!(settings.seed.api_url, "https://api.test");
        assert_eq!(settings.seed.default_score, 50);
        assert_eq!(settings.seed.default_coin, 0);
        assert_eq!(settings.scanner_devices, vec!["/dev/ttyACM0", "/tmp/scanner"]);
    }

    #[tokio::test]
    async fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("reception.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("reception.json"));
        let config = Configuration::new("https://api.test/", "k").with_reward_defaults(10, 5);

        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.api_url, "https://api.test");
    }

    #[tokio::test]
    async fn test_save_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reception.json");
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();
        let store = FileSettingsStore::new(&path);

        store.save(&fixture()).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw[CONFIG_KEY]["apiKey"], "k");
    }

    #[tokio::test]
    async fn test_corrupt_record_falls_back_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reception.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileSettingsStore::new(&path);

        assert!(matches!(store.load().await, Err(StorageError::Corrupt(_))));

        let seed = fixture();
        assert_eq!(load_configuration(&store, &seed).await, seed);
    }

    fn fixture() -> Configuration {
        Configuration::new("https://api.test", "k")
    }
}
