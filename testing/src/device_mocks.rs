//! Mocks for client-side storage and the decode capability.

use async_trait::async_trait;
use reception_core::model::Configuration;
use reception_core::scanner::{CameraDevice, CodeReader, DecodeEvent, ScanError};
use reception_core::storage::{SettingsStore, StorageError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::Sender;

/// [`SettingsStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    saved: Mutex<Option<Configuration>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemorySettingsStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a record.
    #[must_use]
    pub fn with_saved(configuration: Configuration) -> Self {
        Self {
            saved: Mutex::new(Some(configuration)),
            ..Self::default()
        }
    }

    #[allow(clippy::expect_used)] // Poisoning only follows a panicking test
    fn saved_lock(&self) -> MutexGuard<'_, Option<Configuration>> {
        self.saved.lock().expect("settings lock poisoned")
    }

    /// Make subsequent saves fail.
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// The persisted record.
    #[must_use]
    pub fn saved(&self) -> Option<Configuration> {
        self.saved_lock().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<Configuration>, StorageError> {
        Ok(self.saved())
    }

    async fn save(&self, configuration: &Configuration) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        *self.saved_lock() = Some(configuration.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Calls made to a [`MockCodeReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderCall {
    /// `devices()`
    Devices,
    /// `start(device_id)`
    Start(String),
    /// `stop()`
    Stop,
    /// `pause()`
    Pause,
    /// `resume()`
    Resume,
}

#[derive(Debug, Default)]
struct ReaderState {
    devices: Vec<CameraDevice>,
    calls: Vec<ReaderCall>,
    sink: Option<Sender<DecodeEvent>>,
    start_error: Option<ScanError>,
    devices_error: Option<ScanError>,
    stop_error: Option<ScanError>,
}

/// [`CodeReader`] driven by the test: decodes are injected with [`MockCodeReader::emit`].
#[derive(Debug, Default)]
pub struct MockCodeReader {
    inner: Mutex<ReaderState>,
}

impl MockCodeReader {
    /// Reader exposing `devices`.
    #[must_use]
    pub fn with_devices(devices: Vec<CameraDevice>) -> Self {
        Self {
            inner: Mutex::new(ReaderState {
                devices,
                ..ReaderState::default()
            }),
        }
    }

    #[allow(clippy::expect_used)] // Poisoning only follows a panicking test
    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.inner.lock().expect("reader lock poisoned")
    }

    /// Make `start` fail.
    pub fn fail_start(&self, error: ScanError) {
        self.lock().start_error = Some(error);
    }

    /// Make `devices` fail.
    pub fn fail_devices(&self, error: ScanError) {
        self.lock().devices_error = Some(error);
    }

    /// Make `stop` fail.
    pub fn fail_stop(&self, error: ScanError) {
        self.lock().stop_error = Some(error);
    }

    /// All calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ReaderCall> {
        self.lock().calls.clone()
    }

    /// Push a frame outcome into the running session.
    ///
    /// Returns `false` when no session is running.
    pub async fn emit(&self, event: DecodeEvent) -> bool {
        let sink = self.lock().sink.clone();
        match sink {
            Some(sink) => sink.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl CodeReader for MockCodeReader {
    async fn devices(&self) -> Result<Vec<CameraDevice>, ScanError> {
        let mut state = self.lock();
        state.calls.push(ReaderCall::Devices);
        match state.devices_error.clone() {
            Some(error) => Err(error),
            None => Ok(state.devices.clone()),
        }
    }

    async fn start(&self, device_id: &str, events: Sender<DecodeEvent>) -> Result<(), ScanError> {
        let mut state = self.lock();
        state.calls.push(ReaderCall::Start(device_id.to_string()));
        if let Some(error) = state.start_error.clone() {
            return Err(error);
        }
        state.sink = Some(events);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ScanError> {
        let mut state = self.lock();
        state.calls.push(ReaderCall::Stop);
        state.sink = None;
        match state.stop_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn pause(&self) {
        self.lock().calls.push(ReaderCall::Pause);
    }

    fn resume(&self) {
        self.lock().calls.push(ReaderCall::Resume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_settings_store_round_trip_and_failure() {
        let store = MemorySettingsStore::new();
        let configuration = Configuration::new("https://api.test/", "k");

        assert_eq!(assert_ok!(block_on(store.load())), None);
        assert_ok!(block_on(store.save(&configuration)));
        assert_eq!(store.saved(), Some(configuration.clone()));

        store.fail_saves();
        assert_err!(block_on(store.save(&Configuration::default())));
        assert_eq!(store.saved(), Some(configuration));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_reader_emits_only_while_started() {
        let reader = MockCodeReader::default();
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);

        assert!(!block_on(reader.emit(DecodeEvent::NoCode)));
        assert_ok!(block_on(reader.start("cam0", tx)));
        assert!(block_on(reader.emit(DecodeEvent::Decoded("U1".into()))));
        assert_eq!(
            block_on(rx.recv()),
            Some(DecodeEvent::Decoded("U1".into()))
        );

        assert_ok!(block_on(reader.stop()));
        assert!(!block_on(reader.emit(DecodeEvent::NoCode)));
        assert_eq!(
            reader.calls(),
            vec![ReaderCall::Start("cam0".into()), ReaderCall::Stop]
        );
    }
}
