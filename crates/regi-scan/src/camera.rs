//! # Camera Capability
//!
//! The device seam a `ScanSession` drives. Implementations wrap whatever
//! actually reads frames (a webcam library, a browser bridge, a keyboard
//! wedge); the session only needs to list devices and start a decode loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScanResult;

/// Label keywords that identify a rear-facing camera.
pub const REAR_CAMERA_KEYWORDS: [&str; 3] = ["back", "rear", "environment"];

// =============================================================================
// Device Types
// =============================================================================

/// An enumerated video input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub id: String,
    pub label: String,
}

impl CameraInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        CameraInfo {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Label-based rear-facing check (case-insensitive).
    pub fn is_rear_facing(&self) -> bool {
        let label = self.label.to_lowercase();
        REAR_CAMERA_KEYWORDS.iter().any(|k| label.contains(k))
    }
}

/// Decoder settings passed through to the camera backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Frames per second to attempt decoding.
    pub fps: u32,

    /// Width of the scanning box in pixels.
    pub qrbox_width: u32,

    /// Height of the scanning box in pixels.
    pub qrbox_height: u32,

    pub aspect_ratio: f64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            fps: 10,
            qrbox_width: 250,
            qrbox_height: 250,
            aspect_ratio: 1.0,
        }
    }
}

/// One decode attempt on one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    Decoded(String),
    /// Nothing readable in the frame. Expected many times per second.
    Failed(String),
}

// =============================================================================
// Traits
// =============================================================================

/// A source of cameras.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Lists available video inputs.
    async fn enumerate(&self) -> ScanResult<Vec<CameraInfo>>;

    /// Acquires the device and starts decoding frames.
    ///
    /// On `Ok` the device is held until `DecodeLoop::stop` is called.
    async fn start_decoding(
        &self,
        device_id: &str,
        options: &DecodeOptions,
    ) -> ScanResult<Box<dyn DecodeLoop>>;
}

/// A running decode loop bound to one acquired device.
#[async_trait]
pub trait DecodeLoop: Send {
    /// Waits for the next frame result. `None` means the loop ended on its own.
    async fn next_frame(&mut self) -> Option<FrameResult>;

    /// Stops decoding and releases the device.
    async fn stop(&mut self) -> ScanResult<()>;
}

// =============================================================================
// Device Selection
// =============================================================================

/// Picks the camera to use: the first rear-facing one, otherwise the first one.
///
/// Returns `None` for an empty list.
pub fn select_device(cameras: &[CameraInfo]) -> Option<&CameraInfo> {
    cameras
        .iter()
        .find(|c| c.is_rear_facing())
        .or_else(|| cameras.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_rear_camera() {
        let cameras = vec![
            CameraInfo::new("0", "FaceTime HD Camera (front)"),
            CameraInfo::new("1", "Back Camera"),
        ];
        assert_eq!(select_device(&cameras).map(|c| c.id.as_str()), Some("1"));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        for label in ["REAR lens", "camera2 0, facing Environment", "back"] {
            let cameras = vec![CameraInfo::new("a", "Integrated"), CameraInfo::new("b", label)];
            assert_eq!(select_device(&cameras).map(|c| c.id.as_str()), Some("b"));
        }
    }

    #[test]
    fn test_falls_back_to_first() {
        let cameras = vec![
            CameraInfo::new("usb-1", "USB Webcam"),
            CameraInfo::new("usb-2", "Integrated Camera"),
        ];
        assert_eq!(select_device(&cameras).map(|c| c.id.as_str()), Some("usb-1"));
    }

    #[test]
    fn test_empty_list_selects_nothing() {
        assert!(select_device(&[]).is_none());
    }

    #[test]
    fn test_default_decode_options() {
        let options = DecodeOptions::default();
        assert_eq!(options.fps, 10);
        assert_eq!((options.qrbox_width, options.qrbox_height), (250, 250));
    }
}
