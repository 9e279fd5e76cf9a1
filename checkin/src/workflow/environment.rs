//! Environment for the check-in reducer.

use crate::scanner::ScanSession;
use reception_core::api::ReceptionApi;
use reception_core::environment::Clock;
use reception_core::storage::SettingsStore;
use std::sync::Arc;

/// Dependencies the check-in reducer reaches through.
///
/// Effects outlive the reducer call, so collaborators are handed out as
/// shared handles.
pub trait CheckinEnvironment: Send + Sync {
    /// Clock for the event window and the attended-at placeholder.
    fn clock(&self) -> &dyn Clock;

    /// REST API.
    fn api(&self) -> Arc<dyn ReceptionApi>;

    /// Configuration persistence.
    fn settings(&self) -> Arc<dyn SettingsStore>;

    /// The decode session.
    fn scanner(&self) -> Arc<ScanSession>;
}

/// Environment wired from concrete collaborators.
#[derive(Clone)]
pub struct ReceptionEnvironment {
    clock: Arc<dyn Clock>,
    api: Arc<dyn ReceptionApi>,
    settings: Arc<dyn SettingsStore>,
    scanner: Arc<ScanSession>,
}

impl ReceptionEnvironment {
    /// Create a new environment.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        api: Arc<dyn ReceptionApi>,
        settings: Arc<dyn SettingsStore>,
        scanner: Arc<ScanSession>,
    ) -> Self {
        Self {
            clock,
            api,
            settings,
            scanner,
        }
    }
}

impl CheckinEnvironment for ReceptionEnvironment {
    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn api(&self) -> Arc<dyn ReceptionApi> {
        Arc::clone(&self.api)
    }

    fn settings(&self) -> Arc<dyn SettingsStore> {
        Arc::clone(&self.settings)
    }

    fn scanner(&self) -> Arc<ScanSession> {
        Arc::clone(&self.scanner)
    }
}
