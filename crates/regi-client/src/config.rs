//! # Client Configuration
//!
//! Where the backend lives and how long to wait for it.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default backend base URL (the FastAPI dev server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default whole-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL that `/products` and `/purchases` are appended to.
    pub base_url: String,

    pub timeout: Duration,

    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Creates a config for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parses and checks the base URL.
    ///
    /// ## Errors
    /// `InvalidConfig` unless the URL is absolute `http`/`https` and can
    /// carry path segments.
    pub fn parsed_base_url(&self) -> ClientResult<Url> {
        let url = Url::parse(&self.base_url)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "Unsupported URL scheme '{}' in {}",
                url.scheme(),
                self.base_url
            )));
        }

        if url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "{} cannot be used as a base URL",
                self.base_url
            )));
        }

        Ok(url)
    }
}
