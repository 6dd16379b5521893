//! # Transaction State
//!
//! One tagged value describing what the register is showing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      TransactionState Transitions                       │
//! │                                                                         │
//! │        load_by_code / scan decoded                                      │
//! │  Idle ───────────────────────► Loading{code}                           │
//! │   ▲                               │                                     │
//! │   │             ┌─────────────────┼───────────────────┐                 │
//! │   │             ▼                 ▼                   ▼                 │
//! │   │      ProductLoaded     ProductNotFound          Error               │
//! │   │             │                                                       │
//! │   └── add ──────┘                                                       │
//! │                                                                         │
//! │  submit_purchase: * ──► Submitting ──► Purchased{receipt} | Error      │
//! │  reset:           * ──► Idle                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Product loaded" and "product not found" can never both be true.

use chrono::{DateTime, Utc};
use regi_core::{LineItem, Money, Product};
use serde::Serialize;
use ts_rs::TS;

/// What the register is currently showing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export)]
pub enum TransactionState {
    /// Nothing loaded, nothing in flight.
    #[default]
    Idle,

    /// A lookup for `code` is in flight.
    Loading { code: String },

    /// A product is ready to be added to the cart.
    ProductLoaded { product: Product },

    /// The catalog has no product with this code ("master data missing").
    ProductNotFound { code: String },

    /// A purchase submission is in flight.
    Submitting,

    /// The last purchase succeeded; shows backend totals.
    Purchased { receipt: PurchaseReceipt },

    /// The last operation failed.
    Error { message: String, retryable: bool },
}

impl TransactionState {
    /// The product waiting to be added, if any.
    pub fn loaded_product(&self) -> Option<&Product> {
        match self {
            TransactionState::ProductLoaded { product } => Some(product),
            _ => None,
        }
    }

    /// True while a lookup or submission is in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TransactionState::Loading { .. } | TransactionState::Submitting
        )
    }
}

/// A completed purchase, as confirmed by the backend.
///
/// The totals are the backend's. The client-side estimate is never used
/// here, not even when the backend leaves a total out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PurchaseReceipt {
    /// Backend transaction id (`trd_id`).
    pub trade_id: Option<i64>,

    /// Tax-inclusive total (`total_amt`).
    pub total_with_tax: Option<Money>,

    /// Tax-exclusive total (`total_amt_ex_tax`).
    pub total_ex_tax: Option<Money>,

    /// Lines as submitted.
    pub items: Vec<LineItem>,

    #[ts(as = "String")]
    pub completed_at: DateTime<Utc>,
}

impl PurchaseReceipt {
    /// Tax charged, when the backend sent both totals.
    pub fn tax(&self) -> Option<Money> {
        Some(self.total_with_tax? - self.total_ex_tax?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_product_only_when_loaded() {
        let product = Product {
            id: 1,
            code: "1".into(),
            name: "One".into(),
            price: Money::from_minor(100),
        };
        let loaded = TransactionState::ProductLoaded {
            product: product.clone(),
        };
        assert_eq!(loaded.loaded_product(), Some(&product));

        let missing = TransactionState::ProductNotFound { code: "1".into() };
        assert_eq!(missing.loaded_product(), None);
    }

    #[test]
    fn test_in_flight_states() {
        assert!(TransactionState::Submitting.is_in_flight());
        assert!(TransactionState::Loading { code: "x".into() }.is_in_flight());
        assert!(!TransactionState::Idle.is_in_flight());
    }

    #[test]
    fn test_receipt_tax() {
        let receipt = PurchaseReceipt {
            trade_id: Some(1),
            total_with_tax: Some(Money::from_minor(330)),
            total_ex_tax: Some(Money::from_minor(300)),
            items: Vec::new(),
            completed_at: Utc::now(),
        };
        assert_eq!(receipt.tax(), Some(Money::from_minor(30)));

        let partial = PurchaseReceipt {
            total_ex_tax: None,
            ..receipt
        };
        assert_eq!(partial.tax(), None);
    }
}
