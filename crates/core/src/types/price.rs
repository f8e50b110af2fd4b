//! Price arithmetic using decimal amounts.
//!
//! Prices are plain [`Decimal`] amounts in the menu's currency. Keeping them
//! decimal avoids float drift when quantities and add-ons are summed.

use rust_decimal::Decimal;

use super::line_item::AddOn;

/// Per-unit price of an item with the given add-ons, saturating at the
/// `Decimal` range.
///
/// ```
/// use rust_decimal::Decimal;
/// use tableside_core::{AddOn, calculate_total_price};
///
/// let add_ons = [AddOn::new("egg", Decimal::new(150, 2))];
/// assert_eq!(
///     calculate_total_price(Decimal::new(1000, 2), &add_ons),
///     Decimal::new(1150, 2)
/// );
/// ```
#[must_use]
pub fn calculate_total_price(base_price: Decimal, add_ons: &[AddOn]) -> Decimal {
    add_ons
        .iter()
        .fold(base_price, |total, add_on| total.saturating_add(add_on.price))
}

/// Format an amount for display (e.g., "$19.99").
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount.abs())
    }
}
