//! # Register Error Type
//!
//! Everything the coordinator can report to the front end.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Flow in Regi POS                              │
//! │                                                                         │
//! │  ValidationError ──────────────────────► Validation  (no I/O happened) │
//! │  ClientError::Server{detail} ──┐                                        │
//! │  ClientError::Connection ──────┼───────► Transport{message}            │
//! │  ClientError::Timeout ─────────┘         message = detail if present   │
//! │  PurchaseResponse{success:false} ──────► PurchaseRejected              │
//! │  ScanError ────────────────────────────► Camera                        │
//! │  CoreError (cart limits) ──────────────► Cart                          │
//! │                                                                         │
//! │  Every error also lands in TransactionState::Error { message,          │
//! │  retryable } so the front end renders it without inspecting the type.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use regi_client::ClientError;
use regi_core::{CoreError, ValidationError};
use regi_scan::ScanError;
use thiserror::Error;

/// Result type alias for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

#[derive(Debug, Error)]
pub enum RegisterError {
    // =========================================================================
    // Operator Input
    // =========================================================================
    /// Input rejected before any I/O (empty code, empty cart).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another lookup, scan or submission is still in flight.
    #[error("Another operation is in progress")]
    Busy,

    // =========================================================================
    // Backend
    // =========================================================================
    /// Network or server failure. `message` is the backend `detail` when sent.
    #[error("{message}")]
    Transport { message: String, retryable: bool },

    /// The backend answered `success: false`.
    #[error("Purchase was rejected by the server")]
    PurchaseRejected { trade_id: Option<i64> },

    // =========================================================================
    // Device / Cart
    // =========================================================================
    #[error(transparent)]
    Camera(#[from] ScanError),

    #[error(transparent)]
    Cart(#[from] CoreError),

    // =========================================================================
    // Configuration
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

impl From<ClientError> for RegisterError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Validation(v) => RegisterError::Validation(v),
            ClientError::InvalidConfig(message) => RegisterError::InvalidConfig(message),
            other => RegisterError::Transport {
                message: other.user_message(),
                retryable: other.is_retryable(),
            },
        }
    }
}

impl From<std::io::Error> for RegisterError {
    fn from(err: std::io::Error) -> Self {
        RegisterError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for RegisterError {
    fn from(err: toml::de::Error) -> Self {
        RegisterError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for RegisterError {
    fn from(err: toml::ser::Error) -> Self {
        RegisterError::ConfigSaveFailed(err.to_string())
    }
}

impl RegisterError {
    /// Returns true if the operator can retry without changing anything.
    ///
    /// A rejected purchase counts as retryable: the cart is left intact.
    pub fn is_retryable(&self) -> bool {
        match self {
            RegisterError::Transport { retryable, .. } => *retryable,
            RegisterError::Busy | RegisterError::PurchaseRejected { .. } => true,
            RegisterError::Camera(e) => matches!(
                e,
                ScanError::CameraStartFailed(_)
                    | ScanError::DecodeLoopEnded
                    | ScanError::StopFailed(_)
            ),
            _ => false,
        }
    }

    /// True for configuration problems, which only a restart fixes.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RegisterError::InvalidConfig(_)
                | RegisterError::ConfigLoadFailed(_)
                | RegisterError::ConfigSaveFailed(_)
        )
    }

    /// Text for the error banner.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_prefers_backend_detail() {
        let err: RegisterError = ClientError::Server {
            status: 409,
            detail: Some("Stock exhausted for 4901777300446".into()),
        }
        .into();

        assert_eq!(err.user_message(), "Stock exhausted for 4901777300446");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_connection_failure_is_retryable() {
        let err: RegisterError = ClientError::Connection("connection refused".into()).into();
        assert!(matches!(err, RegisterError::Transport { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_validation_stays_validation() {
        let err: RegisterError = ClientError::Validation(ValidationError::Required {
            field: "product code".into(),
        })
        .into();
        assert!(matches!(err, RegisterError::Validation(_)));
        assert_eq!(err.user_message(), "product code is required");
    }

    #[test]
    fn test_camera_errors() {
        assert!(!RegisterError::Camera(ScanError::NoCameraAvailable).is_retryable());
        assert!(RegisterError::Camera(ScanError::CameraStartFailed("denied".into())).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(RegisterError::InvalidConfig("x".into()).is_config_error());
        assert!(!RegisterError::Busy.is_config_error());
    }
}
