//! # Cart Aggregation
//!
//! The in-memory list of line items for the current transaction.
//!
//! ## Aggregation Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_product() Decision                               │
//! │                                                                         │
//! │  lookup "4901777300446" → Product { id: 12, price: 150 }               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Line for id 12 already in cart?                                       │
//! │       │                                                                 │
//! │   YES │ replace line: quantity + 1, subtotal = qty × FROZEN unit price │
//! │    NO │ append line:  quantity 1,   subtotal = price                   │
//! │       ▼                                                                 │
//! │  New Cart snapshot (old snapshot untouched)                            │
//! │                                                                         │
//! │  [{id:12, qty:1, subtotal:150}] ──add──► [{id:12, qty:2, subtotal:300}] │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutable Updates
//! Every operation returns a new `Cart` instead of mutating in place, so the
//! coordinator can swap snapshots atomically and a failed operation leaves
//! the previous snapshot exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, ProductId, TaxRate};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// One aggregated row in the cart, keyed by product identity.
///
/// ## Price Freezing
/// `code`, `name` and `unit_price` are copied from the product when it first
/// enters the cart. Later lookups of the same product only bump the
/// quantity; a price change in the catalog mid-transaction does not drift
/// the subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Catalog identity of the product.
    pub product_id: ProductId,

    /// Product code at time of adding (frozen).
    pub code: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    /// Quantity, always >= 1.
    pub quantity: u32,

    /// `quantity × unit_price`.
    pub subtotal: Money,
}

impl LineItem {
    /// Creates a single-quantity line from a product.
    pub fn from_product(product: &Product) -> Self {
        LineItem {
            product_id: product.id,
            code: product.code.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            subtotal: product.price,
        }
    }

    /// Returns a copy of this line with a new quantity and recomputed subtotal.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        LineItem {
            quantity,
            subtotal: self.unit_price.multiply_quantity(quantity),
            ..self.clone()
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart for one transaction.
///
/// ## Invariants
/// - At most one line per product identity
/// - Lines keep first-add order
/// - Every line has quantity >= 1
/// - `total()` is always the sum of line subtotals
///
/// Lines are private so the only way to change them is `add_product` or
/// `clear`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Cart {
    items: Vec<LineItem>,

    /// When the cart was created/last cleared
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of a product, returning the new cart snapshot.
    ///
    /// ## Behavior
    /// - Product already in cart: its line is replaced with quantity + 1
    /// - Product not in cart: a new line with quantity 1 is appended
    ///
    /// ## Errors
    /// - `QuantityTooLarge` if the line would exceed `MAX_ITEM_QUANTITY`
    /// - `CartTooLarge` if a new line would exceed `MAX_CART_ITEMS`
    pub fn add_product(&self, product: &Product) -> CoreResult<Cart> {
        let mut items = self.items.clone();

        match items.iter().position(|i| i.product_id == product.id) {
            Some(idx) => {
                let requested = items[idx].quantity + 1;
                if requested > MAX_ITEM_QUANTITY {
                    return Err(CoreError::QuantityTooLarge {
                        requested,
                        max: MAX_ITEM_QUANTITY,
                    });
                }
                items[idx] = items[idx].with_quantity(requested);
            }
            None => {
                if items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                items.push(LineItem::from_product(product));
            }
        }

        Ok(Cart {
            items,
            created_at: self.created_at,
        })
    }

    /// Returns an empty cart. The previous snapshot is not touched.
    pub fn clear(&self) -> Cart {
        Cart::new()
    }

    /// Line items in first-add order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Finds the line for a product identity.
    pub fn line(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// When the cart was created or last cleared.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sum of all line subtotals; zero for an empty cart.
    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.subtotal).sum()
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Client-side tax estimate on the cart total.
    ///
    /// Advisory only: the receipt amount always comes from the backend.
    pub fn estimated_tax(&self, rate: TaxRate) -> Money {
        self.total().calculate_tax(rate)
    }

    /// Client-side tax-inclusive estimate.
    pub fn estimated_total(&self, rate: TaxRate) -> Money {
        self.total().with_tax(rate)
    }

    /// Summary of the cart for display.
    pub fn totals(&self, rate: TaxRate) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            subtotal: self.total(),
            estimated_tax: self.estimated_tax(rate),
            estimated_total: self.estimated_total(rate),
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart totals summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u32,
    pub subtotal: Money,
    pub estimated_tax: Money,
    pub estimated_total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
