//! Cart state and the value types exchanged with [`super::CartStore`].

use rust_decimal::Decimal;
use serde::Serialize;

use tableside_core::{AddOn, LineItem};

use crate::discount::DiscountRecord;

/// In-memory cart owned by a [`super::CartStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub items: Vec<LineItem>,
    pub discount: Option<DiscountRecord>,
    /// Uppercased code of the active discount, empty when none.
    pub discount_code: String,
}

impl CartState {
    /// Sum of unit price times quantity over all lines, saturating at the
    /// `Decimal` range.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(LineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }
}

/// Where the active session's stored cart is in its load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// No session to load for.
    #[default]
    Idle,
    /// The stored cart has been requested but not applied yet.
    Loading,
    /// The stored cart (or an empty one) has been applied.
    Loaded,
}

/// Optional parameters of [`super::CartStore::add_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddItemOptions {
    /// Units to add. Defaults to 1.
    pub qty: u32,
    pub add_ons: Vec<AddOn>,
    pub special_instructions: String,
    /// Per-unit price to record verbatim, e.g. for size-adjusted pricing.
    /// Computed from base price and add-ons when absent.
    pub total_item_price: Option<Decimal>,
}

impl Default for AddItemOptions {
    fn default() -> Self {
        Self {
            qty: 1,
            add_ons: Vec::new(),
            special_instructions: String::new(),
            total_item_price: None,
        }
    }
}

impl AddItemOptions {
    #[must_use]
    pub const fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty;
        self
    }

    #[must_use]
    pub fn with_add_ons(mut self, add_ons: Vec<AddOn>) -> Self {
        self.add_ons = add_ons;
        self
    }

    #[must_use]
    pub fn with_instructions(mut self, special_instructions: impl Into<String>) -> Self {
        self.special_instructions = special_instructions.into();
        self
    }

    #[must_use]
    pub const fn with_total_item_price(mut self, total_item_price: Decimal) -> Self {
        self.total_item_price = Some(total_item_price);
        self
    }
}

/// Totals derived from the cart and its discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub final_total: Decimal,
}

#[cfg(test)]
mod tests {
    use tableside_core::ItemId;

    use super::*;

    fn line(id: &str, price: i64, qty: u32) -> LineItem {
        LineItem {
            id: ItemId::new(id),
            name: String::new(),
            base_price: Decimal::from(price),
            qty,
            add_ons: Vec::new(),
            special_instructions: String::new(),
            total_item_price: None,
        }
    }

    #[test]
    fn test_subtotal_and_count() {
        let state = CartState {
            items: vec![line("A", 100, 3), line("B", 25, 2)],
            ..CartState::default()
        };
        assert_eq!(state.subtotal(), Decimal::from(350));
        assert_eq!(state.item_count(), 5);
    }

    #[test]
    fn test_default_has_zero_subtotal() {
        let state = CartState::default();
        assert!(state.items.is_empty());
        assert_eq!(state.subtotal(), Decimal::ZERO);
        assert_eq!(state.item_count(), 0);
    }

    #[test]
    fn test_subtotal_saturates_on_overflow() {
        let mut big = line("A", 0, 2);
        big.total_item_price = Some(Decimal::MAX);
        let state = CartState {
            items: vec![big.clone(), big, line("B", 5, 1)],
            ..CartState::default()
        };
        assert_eq!(state.subtotal(), Decimal::MAX);
    }

    #[test]
    fn test_add_item_options_default_qty() {
        assert_eq!(AddItemOptions::default().qty, 1);
        assert_eq!(AddItemOptions::default().with_qty(4).qty, 4);
    }
}
