//! # regi-register: Transaction Coordinator for Regi POS
//!
//! Ties the backend client, the cart and the scanner into one register
//! flow and exposes a single `TransactionState` for the front end.
//!
//! ## Module Organization
//! - [`coordinator`] - `TransactionCoordinator` and its options
//! - [`state`] - `TransactionState` and `PurchaseReceipt`
//! - [`config`] - `RegisterConfig` (TOML file + `REGI_*` overrides)
//! - [`error`] - `RegisterError`
//!
//! ## Usage
//! ```rust,ignore
//! use regi_register::{RegisterConfig, TransactionCoordinator};
//!
//! let config = RegisterConfig::load_or_default(None);
//! let register = TransactionCoordinator::from_config(&config, camera)?;
//!
//! register.load_by_code("4901777300446").await?;
//! register.add_loaded_product_to_cart()?;
//! let receipt = register.submit_purchase().await?;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod state;

pub use config::{
    BackendSettings, DisplaySettings, RegisterConfig, RegisterSettings, ScannerSettings,
};
pub use coordinator::{CoordinatorOptions, TransactionCoordinator};
pub use error::{RegisterError, RegisterResult};
pub use state::{PurchaseReceipt, TransactionState};

// Front ends name these through the register crate.
pub use regi_client::LookupOutcome;
pub use regi_scan::ScanState;
