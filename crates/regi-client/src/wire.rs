//! # Wire Types
//!
//! JSON bodies exchanged with `POST /purchases`.
//!
//! ```text
//! Request                                  Response
//! {                                        {
//!   "items": [                               "success": true,
//!     {"code": "4901777300446", "qty": 2}    "trd_id": 42,
//!   ],                                       "total_amt": 330,
//!   "emp_cd": "E001"      (optional)         "total_amt_ex_tax": 300
//! }                                        }
//! ```
//!
//! The request carries codes and quantities only. Prices and totals are
//! computed by the backend, and its totals are the ones printed on the
//! receipt.

use regi_core::{Cart, Money};
use serde::{Deserialize, Serialize};

/// One requested line: product code and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub code: String,
    pub qty: u32,
}

/// Body of `POST /purchases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub items: Vec<PurchaseLine>,

    /// Operator (employee) code, omitted when not configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_cd: Option<String>,
}

impl PurchaseRequest {
    /// Snapshots a cart by value. Later cart changes do not affect the request.
    pub fn from_cart(cart: &Cart, emp_cd: Option<String>) -> Self {
        PurchaseRequest {
            items: cart
                .items()
                .iter()
                .map(|line| PurchaseLine {
                    code: line.code.clone(),
                    qty: line.quantity,
                })
                .collect(),
            emp_cd,
        }
    }
}

/// Body returned by `POST /purchases`.
///
/// A rejected purchase may omit everything but `success`. Missing totals
/// stay `None` rather than reading as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub success: bool,

    /// Backend transaction id.
    #[serde(default)]
    pub trd_id: Option<i64>,

    /// Tax-inclusive total.
    #[serde(default)]
    pub total_amt: Option<Money>,

    #[serde(default)]
    pub total_amt_ex_tax: Option<Money>,
}

/// Error body of a non-2xx response.
///
/// `detail` is usually a string, but request validation failures carry a
/// structured list; those are passed through as JSON text.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn into_detail(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regi_core::Product;

    fn product(id: i64, code: &str, price: i64) -> Product {
        Product {
            id,
            code: code.to_string(),
            name: format!("Product {}", id),
            price: Money::from_minor(price),
        }
    }

    #[test]
    fn test_request_from_cart_uses_codes_and_quantities() {
        let tea = product(12, "4901777300446", 150);
        let cola = product(7, "4902102072618", 160);
        let cart = Cart::new()
            .add_product(&tea)
            .and_then(|c| c.add_product(&cola))
            .and_then(|c| c.add_product(&tea))
            .unwrap();

        let request = PurchaseRequest::from_cart(&cart, None);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "items": [
                    {"code": "4901777300446", "qty": 2},
                    {"code": "4902102072618", "qty": 1}
                ]
            })
        );
    }

    #[test]
    fn test_request_includes_employee_code_when_set() {
        let cart = Cart::new().add_product(&product(1, "1", 100)).unwrap();
        let request = PurchaseRequest::from_cart(&cart, Some("E001".into()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["emp_cd"], "E001");
    }

    #[test]
    fn test_rejected_response_decodes_without_totals() {
        let response: PurchaseResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.trd_id, None);
        assert_eq!(response.total_amt, None);
    }

    #[test]
    fn test_accepted_response_without_totals_keeps_them_absent() {
        let response: PurchaseResponse =
            serde_json::from_str(r#"{"success": true, "trd_id": 1}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.total_amt, None);
        assert_eq!(response.total_amt_ex_tax, None);
    }

    #[test]
    fn test_error_body_detail_variants() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Out of stock"}"#).unwrap();
        assert_eq!(body.into_detail().as_deref(), Some("Out of stock"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": [{"msg": "field required"}]}"#).unwrap();
        assert!(body.into_detail().unwrap().contains("field required"));

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.into_detail(), None);
    }
}
