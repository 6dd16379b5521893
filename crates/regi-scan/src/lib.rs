//! # regi-scan: Camera Scan Sessions for Regi POS
//!
//! A `ScanSession` owns one camera for one scan and hands back exactly one
//! decoded code.
//!
//! ## Module Organization
//! - [`camera`] - `Camera`/`DecodeLoop` traits and rear-camera selection
//! - [`session`] - The `ScanSession` state machine
//! - [`error`] - `ScanError`
//! - `mock` - Scripted camera (`test-util` feature)
//!
//! ## Usage
//! ```rust,ignore
//! use regi_scan::{DecodeOptions, ScanSession};
//!
//! let session = ScanSession::new(camera, DecodeOptions::default());
//! let code = match session.open() {
//!     Some(pending) => pending.await,
//!     None => return, // already scanning
//! };
//! session.close().await; // always, to release the camera
//! ```

pub mod camera;
pub mod error;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use camera::{
    select_device, Camera, CameraInfo, DecodeLoop, DecodeOptions, FrameResult,
    REAR_CAMERA_KEYWORDS,
};
pub use error::{ScanError, ScanResult};
pub use session::{PendingScan, ScanSession, ScanState};
