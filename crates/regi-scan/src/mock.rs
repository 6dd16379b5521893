//! Scripted camera for tests.
//!
//! Plays back a fixed list of frame results and counts device
//! acquisitions and releases so tests can assert nothing leaks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::camera::{Camera, CameraInfo, DecodeLoop, DecodeOptions, FrameResult};
use crate::error::{ScanError, ScanResult};

/// Device bookkeeping shared between a `ScriptedCamera` and its loops.
#[derive(Debug, Default)]
pub struct CameraStats {
    enumerations: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    started_devices: Mutex<Vec<String>>,
}

impl CameraStats {
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Successful `start_decoding` calls.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Decode loops stopped.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Devices currently held.
    pub fn active(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }

    /// Device ids passed to `start_decoding`, in call order.
    pub fn started_devices(&self) -> Vec<String> {
        self.started_devices
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

/// A camera whose behaviour is fixed up front.
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    devices: Vec<CameraInfo>,
    frames: Vec<FrameResult>,
    hold_open: bool,
    enumerate_error: Option<String>,
    start_error: Option<String>,
    stop_error: Option<String>,
    start_delay: Option<Duration>,
    stats: Arc<CameraStats>,
}

impl ScriptedCamera {
    /// A camera with these devices whose decode loop ends immediately.
    pub fn new(devices: Vec<CameraInfo>) -> Self {
        ScriptedCamera {
            devices,
            frames: Vec::new(),
            hold_open: false,
            enumerate_error: None,
            start_error: None,
            stop_error: None,
            start_delay: None,
            stats: Arc::new(CameraStats::default()),
        }
    }

    /// A single generic device.
    pub fn single() -> Self {
        Self::new(vec![CameraInfo::new("cam-0", "Back Camera")])
    }

    /// Frames yielded in order by each decode loop.
    pub fn with_frames(mut self, frames: Vec<FrameResult>) -> Self {
        self.frames = frames;
        self
    }

    /// After the scripted frames, wait forever instead of ending the loop.
    pub fn holding_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn failing_enumerate(mut self, message: &str) -> Self {
        self.enumerate_error = Some(message.to_string());
        self
    }

    pub fn failing_start(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    /// `stop()` reports an error (the device is still counted as released).
    pub fn failing_stop(mut self, message: &str) -> Self {
        self.stop_error = Some(message.to_string());
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn stats(&self) -> Arc<CameraStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn enumerate(&self) -> ScanResult<Vec<CameraInfo>> {
        self.stats.enumerations.fetch_add(1, Ordering::SeqCst);
        match &self.enumerate_error {
            Some(message) => Err(ScanError::CameraStartFailed(message.clone())),
            None => Ok(self.devices.clone()),
        }
    }

    async fn start_decoding(
        &self,
        device_id: &str,
        _options: &DecodeOptions,
    ) -> ScanResult<Box<dyn DecodeLoop>> {
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.start_error {
            return Err(ScanError::CameraStartFailed(message.clone()));
        }

        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut started) = self.stats.started_devices.lock() {
            started.push(device_id.to_string());
        }

        Ok(Box::new(ScriptedLoop {
            frames: self.frames.iter().cloned().collect(),
            hold_open: self.hold_open,
            stop_error: self.stop_error.clone(),
            stopped: false,
            stats: self.stats.clone(),
        }))
    }
}

struct ScriptedLoop {
    frames: VecDeque<FrameResult>,
    hold_open: bool,
    stop_error: Option<String>,
    stopped: bool,
    stats: Arc<CameraStats>,
}

#[async_trait]
impl DecodeLoop for ScriptedLoop {
    async fn next_frame(&mut self) -> Option<FrameResult> {
        // One scheduler turn per frame, like a real camera between frames.
        tokio::task::yield_now().await;

        match self.frames.pop_front() {
            Some(frame) => Some(frame),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }

    async fn stop(&mut self) -> ScanResult<()> {
        if !self.stopped {
            self.stopped = true;
            self.stats.released.fetch_add(1, Ordering::SeqCst);
        }

        match &self.stop_error {
            Some(message) => Err(ScanError::StopFailed(message.clone())),
            None => Ok(()),
        }
    }
}
