//! # Scan Session
//!
//! One camera-decode attempt, from device enumeration to device release.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ScanSession States                              │
//! │                                                                         │
//! │  ┌──────┐  open()  ┌─────────────┐ device chosen ┌──────────┐          │
//! │  │ Idle │ ───────► │ Enumerating │ ────────────► │ Starting │          │
//! │  └──┬───┘          └──────┬──────┘               └────┬─────┘          │
//! │     │                     │ no devices /              │ loop attached   │
//! │     │ close()             │ enumerate failed          ▼                 │
//! │     │                     │                      ┌────────┐             │
//! │     │                     │                      │ Active │ ◄─┐ Failed  │
//! │     │                     │                      └───┬────┘ ──┘ frames  │
//! │     │                     │   first Decoded / close() │ / teardown      │
//! │     │                     │   close() while Starting  ▼                 │
//! │     │                     │                      ┌──────────┐           │
//! │     │                     │                      │ Stopping │           │
//! │     │                     │                      └────┬─────┘           │
//! │     │                     ▼                           ▼                 │
//! │     │              ┌──────────────────────────────────────┐             │
//! │     └────────────► │      Stopped (absorbing, released)   │             │
//! │                    └──────────────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - `open()` outside `Idle` is ignored, so there is never a second decode
//!   loop or a second device acquisition.
//! - The caller receives at most one decoded value per session.
//! - Every exit (decode, error, `close()`, drop) goes through the same
//!   release step before `Stopped`.
//! - Operations on a `Stopped` session are no-ops.
//!
//! The decode loop runs on a background task; it hands its single result
//! to the caller through a oneshot channel wrapped in `PendingScan`.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::camera::{select_device, Camera, CameraInfo, DecodeLoop, DecodeOptions, FrameResult};
use crate::error::{ScanError, ScanResult};

// =============================================================================
// Scan State
// =============================================================================

/// Lifecycle state of a scan session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanState {
    /// No device bound.
    Idle,
    /// Listing video inputs.
    Enumerating,
    /// Device chosen, decode loop being attached. Still cancellable.
    Starting { device: CameraInfo },
    /// Decode loop running.
    Active { device: CameraInfo },
    /// Release requested.
    Stopping,
    /// Device released. Terminal.
    Stopped,
}

impl ScanState {
    /// True once the session can no longer hold a device.
    pub fn is_stopped(&self) -> bool {
        matches!(self, ScanState::Stopped)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::Enumerating => write!(f, "enumerating"),
            ScanState::Starting { device } => write!(f, "starting ({})", device.label),
            ScanState::Active { device } => write!(f, "active ({})", device.label),
            ScanState::Stopping => write!(f, "stopping"),
            ScanState::Stopped => write!(f, "stopped"),
        }
    }
}

// =============================================================================
// Pending Scan
// =============================================================================

/// The single result of an opened session.
///
/// Resolves to the decoded text, the device error that ended the session,
/// or `ScanError::Cancelled` if the session stopped without decoding.
#[derive(Debug)]
pub struct PendingScan {
    rx: oneshot::Receiver<ScanResult<String>>,
}

impl Future for PendingScan {
    type Output = ScanResult<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ScanError::Cancelled)))
    }
}

// =============================================================================
// Scan Session
// =============================================================================

/// Exclusive owner of one camera for one scan.
///
/// ## Usage
/// ```rust,ignore
/// let session = ScanSession::new(camera, DecodeOptions::default());
/// if let Some(pending) = session.open() {
///     let result = pending.await;
///     session.close().await;
/// }
/// ```
pub struct ScanSession {
    id: Uuid,
    camera: Arc<dyn Camera>,
    options: DecodeOptions,
    state: Arc<watch::Sender<ScanState>>,
    /// `true` once a stop has been requested.
    cancel: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScanSession {
    pub fn new(camera: Arc<dyn Camera>, options: DecodeOptions) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        let (cancel, _) = watch::channel(false);

        ScanSession {
            id: Uuid::new_v4(),
            camera,
            options,
            state: Arc::new(state),
            cancel,
            task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Watches state changes (for "point the camera at the barcode" UI).
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Starts the session. Must be called inside a Tokio runtime.
    ///
    /// Returns `None` and does nothing unless the session is `Idle`.
    pub fn open(&self) -> Option<PendingScan> {
        let opened = self.state.send_if_modified(|state| {
            if *state == ScanState::Idle {
                *state = ScanState::Enumerating;
                true
            } else {
                false
            }
        });

        if !opened {
            warn!(session_id = %self.id, state = %self.state(), "Ignoring open on non-idle scan session");
            return None;
        }

        info!(session_id = %self.id, "Scan session opened");

        let (reply_tx, reply_rx) = oneshot::channel();
        let runner = SessionRunner {
            id: self.id,
            camera: self.camera.clone(),
            options: self.options.clone(),
            state: self.state.clone(),
        };
        let handle = tokio::spawn(runner.run(self.cancel.subscribe(), reply_tx));
        *self.task_slot() = Some(handle);

        Some(PendingScan { rx: reply_rx })
    }

    /// Stops the session and waits until the device is released.
    ///
    /// Idempotent. Safe from any state, including while the camera is still
    /// starting.
    pub async fn close(&self) {
        let never_opened = self.state.send_if_modified(|state| {
            if *state == ScanState::Idle {
                *state = ScanState::Stopped;
                true
            } else {
                false
            }
        });
        if never_opened {
            debug!(session_id = %self.id, "Closed scan session before open");
            return;
        }

        self.cancel.send_replace(true);

        let handle = self.task_slot().take();
        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!(session_id = %self.id, error = %e, "Scan task failed");
                    self.state.send_replace(ScanState::Stopped);
                }
            }
            None => {
                // Another close() holds the handle, or the session already stopped.
                let mut rx = self.state.subscribe();
                let _ = rx.wait_for(ScanState::is_stopped).await;
            }
        }
    }

    fn task_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // The background task sees this and releases the device on its own.
        self.cancel.send_replace(true);
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Background Task
// =============================================================================

struct SessionRunner {
    id: Uuid,
    camera: Arc<dyn Camera>,
    options: DecodeOptions,
    state: Arc<watch::Sender<ScanState>>,
}

enum StartOutcome {
    Started(ScanResult<Box<dyn DecodeLoop>>),
    Cancelled,
}

/// Resolves once a stop is requested or the session is gone.
async fn stop_requested(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stop| *stop).await;
}

impl SessionRunner {
    async fn run(
        self,
        mut cancel: watch::Receiver<bool>,
        reply: oneshot::Sender<ScanResult<String>>,
    ) {
        let mut reply = Some(reply);

        if let Err(err) = self.drive(&mut cancel, &mut reply).await {
            warn!(session_id = %self.id, error = %err, "Scan session failed");
            if let Some(tx) = reply.take() {
                let _ = tx.send(Err(err));
            }
        }

        // An unused reply sender is dropped here; PendingScan reads that as Cancelled.
        drop(reply);
        self.set_state(ScanState::Stopped);
        info!(session_id = %self.id, "Scan session stopped");
    }

    async fn drive(
        &self,
        cancel: &mut watch::Receiver<bool>,
        reply: &mut Option<oneshot::Sender<ScanResult<String>>>,
    ) -> ScanResult<()> {
        let cameras = tokio::select! {
            biased;
            _ = stop_requested(cancel) => return Ok(()),
            cameras = self.camera.enumerate() => cameras?,
        };
        debug!(session_id = %self.id, count = cameras.len(), "Cameras enumerated");

        let device = select_device(&cameras)
            .cloned()
            .ok_or(ScanError::NoCameraAvailable)?;

        self.set_state(ScanState::Starting {
            device: device.clone(),
        });
        info!(session_id = %self.id, device_id = %device.id, label = %device.label, "Starting camera");

        let mut start = self.camera.start_decoding(&device.id, &self.options);
        let outcome = tokio::select! {
            biased;
            _ = stop_requested(cancel) => StartOutcome::Cancelled,
            started = &mut start => StartOutcome::Started(started),
        };

        let mut decoder = match outcome {
            StartOutcome::Started(started) => started?,
            StartOutcome::Cancelled => {
                self.set_state(ScanState::Stopping);
                debug!(session_id = %self.id, "Cancelled while starting; waiting for start to settle");
                // Whatever the start acquires must still be released.
                if let Ok(mut decoder) = start.await {
                    self.release(decoder.as_mut()).await;
                }
                return Ok(());
            }
        };

        self.set_state(ScanState::Active {
            device: device.clone(),
        });

        let result = loop {
            let frame = tokio::select! {
                biased;
                _ = stop_requested(cancel) => break Ok(()),
                frame = decoder.next_frame() => frame,
            };

            match frame {
                Some(FrameResult::Decoded(text)) => {
                    info!(session_id = %self.id, code = %text, "Code decoded");
                    if let Some(tx) = reply.take() {
                        let _ = tx.send(Ok(text));
                    }
                    break Ok(());
                }
                Some(FrameResult::Failed(reason)) => {
                    trace!(session_id = %self.id, reason = %reason, "No code in frame");
                }
                None => break Err(ScanError::DecodeLoopEnded),
            }
        };

        self.set_state(ScanState::Stopping);
        self.release(decoder.as_mut()).await;
        result
    }

    async fn release(&self, decoder: &mut dyn DecodeLoop) {
        match decoder.stop().await {
            Ok(()) => debug!(session_id = %self.id, "Camera released"),
            Err(e) => error!(session_id = %self.id, error = %e, "Failed to stop decode loop"),
        }
    }

    fn set_state(&self, next: ScanState) {
        trace!(session_id = %self.id, state = %next, "Scan state changed");
        self.state.send_replace(next);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedCamera;
    use std::time::Duration;

    fn devices() -> Vec<CameraInfo> {
        vec![
            CameraInfo::new("front-0", "Front Camera"),
            CameraInfo::new("back-0", "Back Camera"),
        ]
    }

    fn session_for(camera: ScriptedCamera) -> ScanSession {
        ScanSession::new(Arc::new(camera), DecodeOptions::default())
    }

    #[tokio::test]
    async fn test_first_decode_wins() {
        let camera = ScriptedCamera::new(devices()).with_frames(vec![
            FrameResult::Failed("blurry".into()),
            FrameResult::Failed("no code".into()),
            FrameResult::Decoded("4901777300446".into()),
            FrameResult::Decoded("4902102072618".into()),
        ]);
        let stats = camera.stats();
        let session = session_for(camera);

        let pending = session.open().unwrap();
        assert_eq!(pending.await, Ok("4901777300446".to_string()));

        session.close().await;
        assert_eq!(session.state(), ScanState::Stopped);
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.released(), 1);
        assert_eq!(stats.started_devices(), vec!["back-0".to_string()]);
    }

    #[tokio::test]
    async fn test_second_open_is_ignored() {
        let camera = ScriptedCamera::new(devices()).holding_open();
        let stats = camera.stats();
        let session = session_for(camera);

        let first = session.open();
        let second = session.open();
        assert!(first.is_some());
        assert!(second.is_none());

        session.close().await;
        assert_eq!(first.unwrap().await, Err(ScanError::Cancelled));
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.released(), 1);
    }

    #[tokio::test]
    async fn test_no_camera_available() {
        let camera = ScriptedCamera::new(Vec::new());
        let stats = camera.stats();
        let session = session_for(camera);

        let result = session.open().unwrap().await;
        assert_eq!(result, Err(ScanError::NoCameraAvailable));

        session.close().await;
        assert!(session.state().is_stopped());
        assert_eq!(stats.acquired(), 0);
    }

    #[tokio::test]
    async fn test_start_failure_stops_session() {
        let camera = ScriptedCamera::new(devices()).failing_start("permission denied");
        let stats = camera.stats();
        let session = session_for(camera);

        let result = session.open().unwrap().await;
        assert_eq!(
            result,
            Err(ScanError::CameraStartFailed("permission denied".into()))
        );

        session.close().await;
        assert!(session.state().is_stopped());
        assert_eq!(stats.acquired(), 0);
        assert_eq!(stats.released(), 0);
    }

    #[tokio::test]
    async fn test_close_while_starting_releases_device() {
        let camera = ScriptedCamera::new(devices())
            .with_start_delay(Duration::from_millis(50))
            .holding_open();
        let stats = camera.stats();
        let session = session_for(camera);
        let mut states = session.subscribe();

        let pending = session.open().unwrap();
        states
            .wait_for(|s| matches!(s, ScanState::Starting { .. }))
            .await
            .unwrap();

        session.close().await;

        assert_eq!(pending.await, Err(ScanError::Cancelled));
        assert!(session.state().is_stopped());
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.released(), 1);
    }

    #[tokio::test]
    async fn test_close_while_active_releases_device() {
        let camera = ScriptedCamera::new(devices()).holding_open();
        let stats = camera.stats();
        let session = session_for(camera);
        let mut states = session.subscribe();

        let pending = session.open().unwrap();
        states
            .wait_for(|s| matches!(s, ScanState::Active { .. }))
            .await
            .unwrap();

        session.close().await;
        assert_eq!(pending.await, Err(ScanError::Cancelled));
        assert_eq!(stats.active(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let camera = ScriptedCamera::new(devices()).holding_open();
        let stats = camera.stats();
        let session = session_for(camera);

        let _pending = session.open().unwrap();
        session.close().await;
        session.close().await;
        session.close().await;

        assert!(session.state().is_stopped());
        assert_eq!(stats.released(), 1);
        assert!(session.open().is_none());
    }

    #[tokio::test]
    async fn test_close_before_open() {
        let camera = ScriptedCamera::new(devices());
        let stats = camera.stats();
        let session = session_for(camera);

        session.close().await;
        assert!(session.state().is_stopped());
        assert!(session.open().is_none());
        assert_eq!(stats.acquired(), 0);
    }

    #[tokio::test]
    async fn test_decode_loop_ending_is_an_error() {
        let camera = ScriptedCamera::new(devices())
            .with_frames(vec![FrameResult::Failed("dark".into())]);
        let stats = camera.stats();
        let session = session_for(camera);

        let result = session.open().unwrap().await;
        assert_eq!(result, Err(ScanError::DecodeLoopEnded));

        session.close().await;
        assert_eq!(stats.released(), 1);
    }

    #[tokio::test]
    async fn test_stop_failure_still_reaches_stopped() {
        let camera = ScriptedCamera::new(devices())
            .with_frames(vec![FrameResult::Decoded("123".into())])
            .failing_stop("device busy");
        let session = session_for(camera);

        let result = session.open().unwrap().await;
        assert_eq!(result, Ok("123".to_string()));

        session.close().await;
        assert!(session.state().is_stopped());
    }

    #[tokio::test]
    async fn test_drop_releases_device() {
        let camera = ScriptedCamera::new(devices()).holding_open();
        let stats = camera.stats();
        let session = session_for(camera);
        let mut states = session.subscribe();

        let pending = session.open().unwrap();
        states
            .wait_for(|s| matches!(s, ScanState::Active { .. }))
            .await
            .unwrap();

        drop(session);

        // The reply is dropped only after the device is released.
        assert_eq!(pending.await, Err(ScanError::Cancelled));
        assert_eq!(stats.released(), 1);
    }
}
