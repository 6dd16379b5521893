//! # regi-client: Backend REST Client for Regi POS
//!
//! Resolves product codes to priced products and submits purchases.
//!
//! ## Outcomes, Not Exceptions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      lookup("4901777300446")                            │
//! │                                                                         │
//! │   local validation ──► empty code?  ──► Err(ClientError::Validation)   │
//! │          │                              (never hits the network)        │
//! │          ▼                                                              │
//! │   GET {base}/products/{code}                                           │
//! │          │                                                              │
//! │          ├── 200 + product body ──► Ok(LookupOutcome::Found)           │
//! │          ├── 200 + null          ──► Ok(LookupOutcome::NotFound)        │
//! │          ├── 404                 ──► Ok(LookupOutcome::NotFound)        │
//! │          ├── other status        ──► Err(ClientError::Server{detail})  │
//! │          └── no connection       ──► Err(ClientError::Connection)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A product missing from the catalog is an expected answer and renders a
//! "master data missing" banner; a transport failure renders a retry
//! banner. Keeping them apart is the point of `LookupOutcome`.
//!
//! ## Module Organization
//! - [`client`] - `ApiClient` and the `PosBackend` trait seam
//! - [`config`] - Base URL and timeouts
//! - [`error`] - `ClientError`
//! - [`wire`] - Request/response bodies for `/purchases`

pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::{ApiClient, LookupOutcome, PosBackend};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use wire::{PurchaseLine, PurchaseRequest, PurchaseResponse};
