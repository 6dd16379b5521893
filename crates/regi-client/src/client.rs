//! # API Client
//!
//! `ApiClient` talks to the backend over HTTP. The coordinator does not use
//! it directly: it holds an `Arc<dyn PosBackend>` so tests can swap in an
//! in-memory backend that counts calls.

use async_trait::async_trait;
use regi_core::validation::validate_product_code;
use regi_core::Product;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::wire::{ErrorBody, PurchaseRequest, PurchaseResponse};

// =============================================================================
// Lookup Outcome
// =============================================================================

/// Result of resolving a product code.
///
/// `NotFound` is an expected answer, separate from transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Product),
    NotFound { code: String },
}

// =============================================================================
// Backend Seam
// =============================================================================

/// The backend operations the register depends on.
#[async_trait]
pub trait PosBackend: Send + Sync {
    /// Resolves a product code. Empty codes fail locally.
    async fn lookup(&self, code: &str) -> ClientResult<LookupOutcome>;

    /// Submits a purchase snapshot.
    async fn submit_purchase(&self, request: &PurchaseRequest) -> ClientResult<PurchaseResponse>;
}

// =============================================================================
// HTTP Client
// =============================================================================

/// REST client for the register backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds a client with the configured timeouts.
    ///
    /// ## Errors
    /// `InvalidConfig` for an unusable base URL.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = config.parsed_base_url()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        debug!(base_url = %base_url, "API client created");

        Ok(ApiClient { http, base_url })
    }

    /// Shortcut for a client with default timeouts.
    pub fn with_base_url(base_url: &str) -> ClientResult<Self> {
        Self::new(&ClientConfig::new(base_url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfig(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /products/{code}`.
    pub async fn lookup(&self, code: &str) -> ClientResult<LookupOutcome> {
        let code = validate_product_code(code)?;
        let url = self.endpoint(&["products", code])?;

        debug!(code = %code, "Looking up product");

        let response = self.http.get(url).send().await.map_err(|e| {
            error!(code = %code, error = %e, "Product lookup failed");
            ClientError::from(e)
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            info!(code = %code, "Product not in catalog");
            return Ok(LookupOutcome::NotFound {
                code: code.to_string(),
            });
        }

        let response = Self::ensure_success(response).await?;
        let body: Option<Product> = response.json().await?;

        match body {
            Some(product) => {
                info!(code = %code, product_id = product.id, "Product found");
                Ok(LookupOutcome::Found(product))
            }
            None => {
                info!(code = %code, "Product lookup returned null");
                Ok(LookupOutcome::NotFound {
                    code: code.to_string(),
                })
            }
        }
    }

    /// `GET /products`: the whole catalog.
    pub async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let url = self.endpoint(&["products"])?;
        let response = self.http.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        let products: Vec<Product> = response.json().await?;

        debug!(count = products.len(), "Fetched product list");
        Ok(products)
    }

    /// `POST /purchases`.
    ///
    /// A `success: false` body is returned as-is; deciding what it means is
    /// the caller's job.
    pub async fn submit_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> ClientResult<PurchaseResponse> {
        let url = self.endpoint(&["purchases"])?;

        debug!(items = request.items.len(), "Submitting purchase");

        let response = self.http.post(url).json(request).send().await.map_err(|e| {
            error!(error = %e, "Purchase submission failed");
            ClientError::from(e)
        })?;

        let response = Self::ensure_success(response).await?;
        let body: PurchaseResponse = response.json().await?;

        if body.success {
            info!(
                trd_id = ?body.trd_id,
                total_amt = ?body.total_amt.map(|m| m.minor()),
                "Purchase accepted"
            );
        } else {
            warn!(trd_id = ?body.trd_id, "Purchase rejected by backend");
        }

        Ok(body)
    }

    /// Turns a non-2xx response into `ClientError::Server`, keeping `detail`.
    async fn ensure_success(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Body is best-effort; a broken body still yields the status.
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_detail);

        error!(status = status.as_u16(), detail = ?detail, "Backend returned error");

        Err(ClientError::Server {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl PosBackend for ApiClient {
    async fn lookup(&self, code: &str) -> ClientResult<LookupOutcome> {
        ApiClient::lookup(self, code).await
    }

    async fn submit_purchase(&self, request: &PurchaseRequest) -> ClientResult<PurchaseResponse> {
        ApiClient::submit_purchase(self, request).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
