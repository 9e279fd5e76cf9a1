//! Scan adapter around the external decode capability.
//!
//! [`ScanSession`] owns the single decode session: at most one is active,
//! stopping is idempotent, and pause/resume only reach the reader while a
//! session runs. Frame outcomes arrive on the receiver returned by
//! [`ScanSession::new`]; [`forward_decodes`] drops the no-code frames and
//! hands decoded text on.
//!
//! [`LineCodeReader`] is the shipped [`CodeReader`]: keyboard-wedge and serial
//! QR scanners emit one decoded code per line on a device file.

use async_trait::async_trait;
use reception_core::scanner::{CameraDevice, CodeReader, DecodeEvent, ScanError};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

/// Buffered frame outcomes before the reader is back-pressured
const DECODE_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Idle,
    Starting,
    Active(String),
}

/// The one decode session of the desk.
pub struct ScanSession {
    reader: Arc<dyn CodeReader>,
    sink: Sender<DecodeEvent>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl ScanSession {
    /// Wrap `reader`; decode outcomes of every session arrive on the receiver.
    #[must_use]
    pub fn new(reader: Arc<dyn CodeReader>) -> (Self, Receiver<DecodeEvent>) {
        let (sink, events) = mpsc::channel(DECODE_CHANNEL_CAPACITY);
        (
            Self {
                reader,
                sink,
                state: Mutex::new(SessionState::Idle),
            },
            events,
        )
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// List capture devices.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Enumerate`] when the reader cannot list devices.
    pub async fn devices(&self) -> Result<Vec<CameraDevice>, ScanError> {
        self.reader.devices().await
    }

    /// Device of the running session.
    #[must_use]
    pub fn active_device(&self) -> Option<String> {
        match &*self.lock() {
            SessionState::Active(device) => Some(device.clone()),
            _ => None,
        }
    }

    /// Start decoding from `device_id`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::AlreadyActive`] when a session is running or starting
    /// - whatever the reader reports when the device cannot be opened
    pub async fn start(&self, device_id: &str) -> Result<(), ScanError> {
        {
            let mut state = self.lock();
            if *state != SessionState::Idle {
                return Err(ScanError::AlreadyActive);
            }
            *state = SessionState::Starting;
        }

        match self.reader.start(device_id, self.sink.clone()).await {
            Ok(()) => {
                *self.lock() = SessionState::Active(device_id.to_string());
                tracing::info!(device_id, "Decode session started");
                Ok(())
            },
            Err(error) => {
                *self.lock() = SessionState::Idle;
                Err(error)
            },
        }
    }

    /// Stop the running session; a no-op when none runs.
    ///
    /// The session counts as stopped even when the reader reports an error.
    ///
    /// # Errors
    ///
    /// Returns the reader's [`ScanError::Stop`] after marking the session idle.
    pub async fn stop(&self) -> Result<(), ScanError> {
        let previous = std::mem::replace(&mut *self.lock(), SessionState::Idle);
        if previous == SessionState::Idle {
            tracing::trace!("Stop requested without an active session");
            return Ok(());
        }

        self.reader.stop().await?;
        tracing::info!("Decode session stopped");
        Ok(())
    }

    /// Suspend decode reporting while the session stays open.
    pub fn pause(&self) {
        if self.active_device().is_some() {
            self.reader.pause();
        }
    }

    /// Resume decode reporting.
    pub fn resume(&self) {
        if self.active_device().is_some() {
            self.reader.resume();
        }
    }
}

/// Hand decoded text to `on_decoded` until the channel closes or it returns `false`.
///
/// No-code frames are dropped without a trace.
pub async fn forward_decodes<F, Fut>(mut events: Receiver<DecodeEvent>, mut on_decoded: F)
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = bool>,
{
    while let Some(event) = events.recv().await {
        match event {
            DecodeEvent::Decoded(text) => {
                if !on_decoded(text).await {
                    break;
                }
            },
            DecodeEvent::NoCode => {},
        }
    }
}

/// [`CodeReader`] for scanners that write one decoded code per line.
///
/// Each configured device path is one device. Blank lines are reported as
/// [`DecodeEvent::NoCode`].
#[derive(Debug, Default)]
pub struct LineCodeReader {
    device_paths: Vec<String>,
    paused: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LineCodeReader {
    /// Reader offering `device_paths` as devices.
    #[must_use]
    pub fn new(device_paths: Vec<String>) -> Self {
        Self {
            device_paths,
            ..Self::default()
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CodeReader for LineCodeReader {
    async fn devices(&self) -> Result<Vec<CameraDevice>, ScanError> {
        Ok(self
            .device_paths
            .iter()
            .map(|path| CameraDevice {
                id: path.clone(),
                label: Path::new(path)
                    .file_name()
                    .map_or_else(|| path.clone(), |name| name.to_string_lossy().into_owned()),
            })
            .collect())
    }

    async fn start(&self, device_id: &str, events: Sender<DecodeEvent>) -> Result<(), ScanError> {
        if self.task().as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(ScanError::AlreadyActive);
        }

        let file = tokio::fs::File::open(device_id)
            .await
            .map_err(|e| ScanError::Start(format!("{device_id}: {e}")))?;

        self.paused.store(false, Ordering::SeqCst);
        let paused = Arc::clone(&self.paused);
        let device = device_id.to_string();

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if paused.load(Ordering::SeqCst) {
                            tracing::trace!("Decode dropped while paused");
                            continue;
                        }
                        let code = line.trim();
                        let event = if code.is_empty() {
                            DecodeEvent::NoCode
                        } else {
                            DecodeEvent::Decoded(code.to_string())
                        };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    },
                    Ok(None) => {
                        tracing::debug!(%device, "Scanner device reached end of input");
                        break;
                    },
                    Err(error) => {
                        tracing::warn!(%device, %error, "Scanner device read failed");
                        break;
                    },
                }
            }
        });

        *self.task() = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ScanError> {
        if let Some(task) = self.task().take() {
            task.abort();
        }
        Ok(())
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use reception_testing::{MockCodeReader, ReaderCall};
    use std::io::Write;

    fn camera(id: &str) -> CameraDevice {
        CameraDevice {
            id: id.to_string(),
            label: String::new(),
        }
    }

    #[tokio::test]
    async fn test_stop_without_session_is_noop() {
        let reader = Arc::new(MockCodeReader::with_devices(vec![camera("cam0")]));
        let (session, _events) = ScanSession::new(reader.clone());

        session.stop().await.unwrap();
        session.stop().await.unwrap();

        assert!(reader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_one_session_at_a_time() {
        let reader = Arc::new(MockCodeReader::with_devices(vec![camera("cam0")]));
        let (session, _events) = ScanSession::new(reader.clone());

        session.start("cam0").await.unwrap();
        assert_eq!(session.start("cam1").await, Err(ScanError::AlreadyActive));
        assert_eq!(session.active_device().as_deref(), Some("cam0"));

        session.stop().await.unwrap();
        session.start("cam1").await.unwrap();

        assert_eq!(
            reader.calls(),
            vec![
                ReaderCall::Start("cam0".into()),
                ReaderCall::Stop,
                ReaderCall::Start("cam1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_start_leaves_session_idle() {
        let reader = Arc::new(MockCodeReader::default());
        reader.fail_start(ScanError::Start("permission denied".into()));
        let (session, _events) = ScanSession::new(reader.clone());

        tokio_test::assert_err!(session.start("cam0").await);
        assert!(session.active_device().is_none());

        session.pause();
        assert_eq!(reader.calls(), vec![ReaderCall::Start("cam0".into())]);
    }

    #[tokio::test]
    async fn test_failed_stop_still_marks_idle() {
        let reader = Arc::new(MockCodeReader::default());
        reader.fail_stop(ScanError::Stop("busy".into()));
        let (session, _events) = ScanSession::new(reader.clone());

        tokio_test::assert_ok!(session.start("cam0").await);
        tokio_test::assert_err!(session.stop().await);
        assert!(session.active_device().is_none());
    }

    #[tokio::test]
    async fn test_forward_skips_no_code_frames() {
        let reader = Arc::new(MockCodeReader::default());
        let (session, events) = ScanSession::new(reader.clone());
        session.start("cam0").await.unwrap();

        assert!(reader.emit(DecodeEvent::NoCode).await);
        assert!(reader.emit(DecodeEvent::Decoded("U123".into())).await);
        assert!(reader.emit(DecodeEvent::NoCode).await);
        assert!(reader.emit(DecodeEvent::Decoded("U456".into())).await);
        drop(session);
        reader.stop().await.unwrap();

        let mut seen = Vec::new();
        forward_decodes(events, |text| {
            seen.push(text);
            async { true }
        })
        .await;

        assert_eq!(seen, vec!["U123", "U456"]);
    }

    #[tokio::test]
    async fn test_line_reader_emits_trimmed_codes() {
        let mut device = tempfile::NamedTempFile::new().unwrap();
        write!(device, "U123\n\n  U456 \n").unwrap();
        let path = device.path().to_string_lossy().into_owned();

        let reader = LineCodeReader::new(vec![path.clone()]);
        let listed = reader.devices().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, path);

        let (sink, mut events) = mpsc::channel(8);
        reader.start(&path, sink).await.unwrap();

        assert_eq!(events.recv().await, Some(DecodeEvent::Decoded("U123".into())));
        assert_eq!(events.recv().await, Some(DecodeEvent::NoCode));
        assert_eq!(events.recv().await, Some(DecodeEvent::Decoded("U456".into())));
        assert_eq!(events.recv().await, None);

        reader.stop().await.unwrap();
        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_line_reader_rejects_missing_device() {
        let reader = LineCodeReader::new(Vec::new());
        let (sink, _events) = mpsc::channel(1);
        let result = reader.start("/nonexistent/scanner", sink).await;
        assert!(matches!(result, Err(ScanError::Start(_))));
    }
}
