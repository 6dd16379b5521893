//! # regi-core: Pure Transaction Logic for Regi POS
//!
//! This crate is the **heart** of the register. It contains the cart
//! aggregation engine and the money math as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Regi POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Display layer (external collaborator)              │   │
//! │  │    Code field ──► Loaded product ──► Cart table ──► Receipt     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             regi-register (TransactionCoordinator)              │   │
//! │  └──────┬──────────────────────┬──────────────────────┬────────────┘   │
//! │         │                      │                      │                 │
//! │  ┌──────▼──────┐  ┌────────────▼────────────┐  ┌──────▼──────┐         │
//! │  │ regi-client │  │ ★ regi-core (THIS) ★    │  │  regi-scan  │         │
//! │  │  REST API   │  │ Money • Cart • Validate │  │ ScanSession │         │
//! │  └─────────────┘  │ NO I/O • PURE FUNCTIONS │  └─────────────┘         │
//! │                   └─────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, TaxRate)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart aggregation (LineItem, Cart, CartTotals)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation run before any I/O
//!
//! ## Example Usage
//!
//! ```rust
//! use regi_core::{Cart, Money, Product};
//!
//! let product = Product {
//!     id: 12,
//!     code: "4901777300446".to_string(),
//!     name: "Green Tea 500ml".to_string(),
//!     price: Money::from_minor(150),
//! };
//!
//! let cart = Cart::new()
//!     .add_product(&product)
//!     .and_then(|cart| cart.add_product(&product))
//!     .unwrap();
//!
//! assert_eq!(cart.items().len(), 1);
//! assert_eq!(cart.items()[0].quantity, 2);
//! assert_eq!(cart.total(), Money::from_minor(300));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartTotals, LineItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct line items allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps purchase requests a reasonable size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering from a scanner stuck on repeat.
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Default consumption tax rate in basis points (10%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;
