//! # Scan Error Types
//!
//! Device-layer failures. Every one of them ends with the session in
//! `Stopped` and the camera released.

use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Enumeration returned no devices.
    #[error("No camera available")]
    NoCameraAvailable,

    /// Enumeration or decode-loop start failed (e.g. permission denied).
    #[error("Camera failed to start: {0}")]
    CameraStartFailed(String),

    /// The session was closed before anything was decoded.
    #[error("Scan cancelled")]
    Cancelled,

    /// The decode loop finished without producing a code.
    #[error("Camera stopped before a code was decoded")]
    DecodeLoopEnded,

    /// Releasing the device reported an error.
    #[error("Failed to stop camera: {0}")]
    StopFailed(String),
}

impl ScanError {
    /// True when the operator simply closed the scanner.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ScanError::CameraStartFailed("permission denied".into()).to_string(),
            "Camera failed to start: permission denied"
        );
        assert_eq!(ScanError::NoCameraAvailable.to_string(), "No camera available");
        assert!(ScanError::Cancelled.is_cancelled());
        assert!(!ScanError::DecodeLoopEnded.is_cancelled());
    }
}
