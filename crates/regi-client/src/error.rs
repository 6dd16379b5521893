//! # Client Error Types
//!
//! Failures talking to the backend.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Local          │  │   Transport     │  │     Server              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  Connection     │  │  Server{status,detail}  │ │
//! │  │  InvalidConfig  │  │  Timeout        │  │  Decode                 │ │
//! │  │                 │  │  Http           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Product not found" is deliberately absent: it is a `LookupOutcome`.

use regi_core::ValidationError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Input rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Base URL or client settings are unusable.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the backend at all.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The backend did not answer in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other failure while sending the request.
    #[error("HTTP request failed: {0}")]
    Http(String),

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// Non-2xx response. `detail` is the backend's own message, if it sent one.
    #[error("Server returned {status}{}", detail_suffix(.detail))]
    Server { status: u16, detail: Option<String> },

    /// Response body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(err.to_string())
    }
}

impl ClientError {
    /// Returns true if the operator may try the same request again.
    ///
    /// Every backend answer counts, 4xx included: nothing local changed, and
    /// a rejection such as "out of stock" can clear on the server side.
    /// Local validation and undecodable bodies are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connection(_)
                | ClientError::Timeout(_)
                | ClientError::Http(_)
                | ClientError::Server { .. }
        )
    }

    /// The message the operator should see.
    ///
    /// Prefers the backend's `detail` over the generic status line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}
