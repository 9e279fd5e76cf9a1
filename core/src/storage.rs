//! Persistence of the single configuration record.

use crate::model::Configuration;
use async_trait::async_trait;
use thiserror::Error;

/// Storage key the configuration record is written under.
pub const CONFIG_KEY: &str = "reception_app_config";

/// Errors from a [`SettingsStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record could not be decoded
    #[error("stored configuration is corrupt: {0}")]
    Corrupt(String),
}

/// Client-side storage for [`Configuration`].
///
/// Loaded once at startup, written only by an explicit save.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored record, `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<Configuration>, StorageError>;

    /// Persist the record, replacing any previous one.
    async fn save(&self, configuration: &Configuration) -> Result<(), StorageError>;
}
