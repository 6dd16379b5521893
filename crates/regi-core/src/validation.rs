//! # Validation Module
//!
//! Input checks that run before any network or device I/O.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (Rust, no I/O)                                   │
//! │  ├── Empty / oversized product code                                    │
//! │  └── Empty cart before purchase                                        │
//! │           │                                                             │
//! │           ▼  only valid input continues                                │
//! │  Layer 2: Backend                                                      │
//! │  └── Catalog membership (404 → NotFound, not an error)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::cart::Cart;
use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product code accepted (JAN/EAN codes are 8 or 13 digits; this
/// leaves room for in-store codes).
pub const MAX_PRODUCT_CODE_LEN: usize = 64;

/// Validates a product code typed by the operator or decoded by a scanner.
///
/// ## Returns
/// The trimmed code.
///
/// ## Example
/// ```rust
/// use regi_core::validation::validate_product_code;
///
/// assert_eq!(validate_product_code(" 4901777300446\n").unwrap(), "4901777300446");
/// assert!(validate_product_code("   ").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<&str> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "product code".to_string(),
        });
    }

    if code.chars().count() > MAX_PRODUCT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "product code".to_string(),
            max: MAX_PRODUCT_CODE_LEN,
        });
    }

    Ok(code)
}

/// Ensures a cart has something to purchase.
pub fn validate_purchasable(cart: &Cart) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Product;

    #[test]
    fn test_product_code_is_trimmed() {
        assert_eq!(validate_product_code("  ABC-1 ").unwrap(), "ABC-1");
    }

    #[test]
    fn test_empty_product_code_rejected() {
        assert!(matches!(
            validate_product_code(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_product_code(" \t\n"),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_long_product_code_rejected() {
        let code = "9".repeat(MAX_PRODUCT_CODE_LEN + 1);
        assert!(matches!(
            validate_product_code(&code),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_empty_cart_not_purchasable() {
        assert_eq!(
            validate_purchasable(&Cart::new()),
            Err(ValidationError::EmptyCart)
        );

        let product = Product {
            id: 1,
            code: "1".to_string(),
            name: "One".to_string(),
            price: Money::from_minor(1),
        };
        let cart = Cart::new().add_product(&product).unwrap();
        assert!(validate_purchasable(&cart).is_ok());
    }

    #[test]
    fn test_tax_rate_range() {
        assert!(validate_tax_rate_bps(1000).is_ok());
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }
}
