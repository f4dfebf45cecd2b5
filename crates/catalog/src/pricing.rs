//! Derived pricing fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing values computed from the stored inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedPricing {
    /// The price a customer pays: the sale price when set, else the base price.
    pub current_price: Decimal,
    pub sale_price: Option<Decimal>,
    /// Margin as a percentage of the current price, rounded to 2 places.
    pub profit_margin: Option<Decimal>,
}

/// Computes `current_price` and `profit_margin`.
///
/// The margin is `None` when no cost is known or the current price is not
/// positive. Amounts are expected within the validated money range
/// (0 to 99999.99, two decimal places), where the margin always fits.
/// Create and update flows must both go through this function so
/// stored values never drift apart.
pub fn derive_pricing(
    base_price: Decimal,
    sale_price: Option<Decimal>,
    cost: Option<Decimal>,
) -> DerivedPricing {
    let current_price = sale_price.unwrap_or(base_price);

    let profit_margin = match cost {
        Some(cost) if current_price > Decimal::ZERO => (current_price - cost)
            .checked_div(current_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .and_then(round2),
        _ => None,
    };

    DerivedPricing {
        current_price,
        sale_price,
        profit_margin,
    }
}

// Half-up towards positive infinity, matching how margins were always rounded.
fn round2(value: Decimal) -> Option<Decimal> {
    let half = Decimal::new(5, 1);
    let scaled = value.checked_mul(Decimal::ONE_HUNDRED)?.checked_add(half)?;
    scaled.floor().checked_div(Decimal::ONE_HUNDRED)
}
