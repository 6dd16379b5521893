//! Text rendering of register state.

use regi_core::{Cart, CartTotals, Money};
use regi_register::{DisplaySettings, PurchaseReceipt, TransactionState};

pub fn render_state(state: &TransactionState, display: &DisplaySettings) -> String {
    match state {
        TransactionState::Idle => "Ready.".to_string(),
        TransactionState::Loading { code } => format!("Looking up {}...", code),
        TransactionState::ProductLoaded { product } => format!(
            "{} [{}] {}  (type `add` to add it)",
            product.name,
            product.code,
            display.format_currency(product.price)
        ),
        TransactionState::ProductNotFound { code } => {
            format!("No product master for {}.", code)
        }
        TransactionState::Submitting => "Submitting purchase...".to_string(),
        TransactionState::Purchased { receipt } => render_receipt(receipt, display),
        TransactionState::Error { message, retryable } => {
            if *retryable {
                format!("Error: {} (you can retry)", message)
            } else {
                format!("Error: {}", message)
            }
        }
    }
}

pub fn render_cart(cart: &Cart, totals: &CartTotals, display: &DisplaySettings) -> String {
    if cart.is_empty() {
        return "Cart is empty.".to_string();
    }

    let mut lines: Vec<String> = cart
        .items()
        .iter()
        .map(|line| {
            format!(
                "  {:>3} x {:<28} {:>10} {:>12}",
                line.quantity,
                line.name,
                display.format_currency(line.unit_price),
                display.format_currency(line.subtotal)
            )
        })
        .collect();

    lines.push(format!(
        "  {} item(s), {} unit(s)",
        totals.item_count, totals.total_quantity
    ));
    lines.push(format!(
        "  Subtotal       {:>12}",
        display.format_currency(totals.subtotal)
    ));
    lines.push(format!(
        "  Tax (est.)     {:>12}",
        display.format_currency(totals.estimated_tax)
    ));
    lines.push(format!(
        "  Total (est.)   {:>12}",
        display.format_currency(totals.estimated_total)
    ));

    lines.join("\n")
}

/// Receipt totals are the backend's, never the estimate.
pub fn render_receipt(receipt: &PurchaseReceipt, display: &DisplaySettings) -> String {
    let heading = match receipt.trade_id {
        Some(id) => format!("Purchase complete (transaction #{}).", id),
        None => "Purchase complete.".to_string(),
    };

    let amount = |money: Option<Money>| match money {
        Some(money) => display.format_currency(money),
        None => "unavailable".to_string(),
    };

    [
        heading,
        format!("  Subtotal       {:>12}", amount(receipt.total_ex_tax)),
        format!("  Tax            {:>12}", amount(receipt.tax())),
        format!("  Total          {:>12}", amount(receipt.total_with_tax)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use regi_core::{Product, TaxRate};

    fn tea() -> Product {
        Product {
            id: 12,
            code: "4901777300446".into(),
            name: "Green Tea 500ml".into(),
            price: Money::from_minor(150),
        }
    }

    #[test]
    fn test_render_loaded_product() {
        let state = TransactionState::ProductLoaded { product: tea() };
        let text = render_state(&state, &DisplaySettings::default());
        assert!(text.contains("Green Tea 500ml"));
        assert!(text.contains("¥150"));
    }

    #[test]
    fn test_render_not_found_and_error() {
        let display = DisplaySettings::default();
        let missing = TransactionState::ProductNotFound {
            code: "000".into(),
        };
        assert_eq!(render_state(&missing, &display), "No product master for 000.");

        let error = TransactionState::Error {
            message: "connection refused".into(),
            retryable: true,
        };
        assert_eq!(
            render_state(&error, &display),
            "Error: connection refused (you can retry)"
        );
    }

    #[test]
    fn test_render_cart() {
        let cart = Cart::new().add_product(&tea()).unwrap().add_product(&tea()).unwrap();
        let totals = cart.totals(TaxRate::from_bps(1000));
        let text = render_cart(&cart, &totals, &DisplaySettings::default());

        assert!(text.contains("2 x Green Tea 500ml"));
        assert!(text.contains("¥300"));
        assert!(text.contains("¥330"));
        assert_eq!(
            render_cart(&Cart::new(), &Cart::new().totals(TaxRate::zero()), &DisplaySettings::default()),
            "Cart is empty."
        );
    }

    #[test]
    fn test_receipt_without_backend_totals() {
        let receipt = PurchaseReceipt {
            trade_id: Some(9),
            total_with_tax: None,
            total_ex_tax: Some(Money::from_minor(300)),
            items: Vec::new(),
            completed_at: Utc::now(),
        };
        let text = render_receipt(&receipt, &DisplaySettings::default());

        assert!(text.contains("transaction #9"));
        assert!(text.contains("¥300"));
        let total = text.lines().last().unwrap().trim();
        assert!(total.starts_with("Total"));
        assert!(total.ends_with("unavailable"));
        assert!(!text.contains("¥0"));
    }
}
