//! Contract for the external decode-from-camera capability.
//!
//! The desk never decodes images itself. A [`CodeReader`] runs a decode
//! session against one capture device and reports every frame outcome on a
//! channel; the scan adapter in the application decides what to forward.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::Sender;

/// A capture device the reader can decode from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Identifier passed back to [`CodeReader::start`]
    pub id: String,
    /// Human readable label
    pub label: String,
}

impl CameraDevice {
    /// Label to show, falling back to the id.
    #[must_use]
    pub fn display_label(&self) -> String {
        if self.label.is_empty() {
            format!("Camera {}", self.id)
        } else {
            self.label.clone()
        }
    }
}

/// One frame outcome from a decode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A code was decoded
    Decoded(String),
    /// No code in frame; expected at high frequency
    NoCode,
}

/// Errors from the decode capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Devices could not be enumerated (usually a permission problem)
    #[error("device enumeration failed: {0}")]
    Enumerate(String),

    /// The session could not be started
    #[error("failed to start decode session: {0}")]
    Start(String),

    /// A session is already running
    #[error("a decode session is already active")]
    AlreadyActive,

    /// The session could not be stopped cleanly
    #[error("failed to stop decode session: {0}")]
    Stop(String),
}

/// External decode-from-camera capability.
#[async_trait]
pub trait CodeReader: Send + Sync {
    /// List capture devices.
    async fn devices(&self) -> Result<Vec<CameraDevice>, ScanError>;

    /// Start decoding from `device_id`, reporting outcomes on `events`.
    async fn start(&self, device_id: &str, events: Sender<DecodeEvent>) -> Result<(), ScanError>;

    /// Stop the running session.
    async fn stop(&self) -> Result<(), ScanError>;

    /// Stop reporting decodes without releasing the device.
    fn pause(&self);

    /// Resume reporting after [`CodeReader::pause`].
    fn resume(&self);
}
