//! # Keyboard-Wedge Camera
//!
//! Barcode scanners in keyboard-wedge mode type the code followed by Enter,
//! so during a scan the next stdin line plays the part of a decoded frame.
//!
//! ```text
//! stdin thread ──► mpsc ──► LineSource ──┬──► command loop (between scans)
//!                                        └──► StdinDecodeLoop (during a scan)
//! ```
//!
//! Only one reader holds the source at a time: the command loop does not
//! read while a scan is running.

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use regi_scan::{Camera, CameraInfo, DecodeLoop, DecodeOptions, FrameResult, ScanResult};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

/// Device id reported by `StdinCamera`.
pub const WEDGE_DEVICE_ID: &str = "stdin";

/// Operator input lines, shared by the command loop and the camera.
pub type LineSource = Arc<Mutex<mpsc::Receiver<String>>>;

/// Reads stdin on a dedicated thread.
///
/// A blocking read on a plain thread does not hold up runtime shutdown when
/// the operator quits.
pub fn spawn_stdin_reader() -> std::io::Result<LineSource> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
            debug!("stdin closed");
        })?;

    Ok(Arc::new(Mutex::new(rx)))
}

/// Next operator line, or `None` once stdin is closed.
pub async fn next_line(source: &LineSource) -> Option<String> {
    source.lock().await.recv().await
}

/// A `Camera` that decodes whatever the operator (or wedge scanner) types.
#[derive(Debug, Clone)]
pub struct StdinCamera {
    lines: LineSource,
}

impl StdinCamera {
    pub fn new(lines: LineSource) -> Self {
        StdinCamera { lines }
    }
}

#[async_trait]
impl Camera for StdinCamera {
    async fn enumerate(&self) -> ScanResult<Vec<CameraInfo>> {
        Ok(vec![CameraInfo::new(WEDGE_DEVICE_ID, "Keyboard wedge scanner")])
    }

    async fn start_decoding(
        &self,
        device_id: &str,
        options: &DecodeOptions,
    ) -> ScanResult<Box<dyn DecodeLoop>> {
        debug!(device_id, fps = options.fps, "Keyboard wedge armed");
        Ok(Box::new(StdinDecodeLoop {
            lines: self.lines.clone(),
        }))
    }
}

struct StdinDecodeLoop {
    lines: LineSource,
}

#[async_trait]
impl DecodeLoop for StdinDecodeLoop {
    async fn next_frame(&mut self) -> Option<FrameResult> {
        let line = next_line(&self.lines).await?;
        let text = line.trim();

        Some(if text.is_empty() {
            FrameResult::Failed("empty line".into())
        } else {
            FrameResult::Decoded(text.to_string())
        })
    }

    async fn stop(&mut self) -> ScanResult<()> {
        debug!("Keyboard wedge released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regi_scan::{ScanError, ScanSession};

    fn source() -> (mpsc::Sender<String>, LineSource) {
        let (tx, rx) = mpsc::channel(8);
        (tx, Arc::new(Mutex::new(rx)))
    }

    #[tokio::test]
    async fn test_blank_lines_are_failed_frames() {
        let (tx, lines) = source();
        tx.send("   ".into()).await.unwrap();
        tx.send(" 4901777300446 ".into()).await.unwrap();

        let session = ScanSession::new(Arc::new(StdinCamera::new(lines)), DecodeOptions::default());
        let code = session.open().unwrap().await;
        session.close().await;

        assert_eq!(code, Ok("4901777300446".to_string()));
        assert!(session.state().is_stopped());
    }

    #[tokio::test]
    async fn test_closed_stdin_ends_the_scan() {
        let (tx, lines) = source();
        drop(tx);

        let session = ScanSession::new(Arc::new(StdinCamera::new(lines)), DecodeOptions::default());
        let result = session.open().unwrap().await;
        session.close().await;

        assert_eq!(result, Err(ScanError::DecodeLoopEnded));
    }

    #[tokio::test]
    async fn test_lines_after_scan_go_back_to_commands() {
        let (tx, lines) = source();
        tx.send("123".into()).await.unwrap();
        tx.send("cart".into()).await.unwrap();

        let session = ScanSession::new(
            Arc::new(StdinCamera::new(lines.clone())),
            DecodeOptions::default(),
        );
        assert_eq!(session.open().unwrap().await, Ok("123".to_string()));
        session.close().await;

        assert_eq!(next_line(&lines).await.as_deref(), Some("cart"));
    }
}
