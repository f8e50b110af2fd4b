//! Cart line items and the signature that decides when two additions merge.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AddOnId, ItemId};
use super::price::calculate_total_price;

/// A catalog item as offered on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Catalog identifier.
    pub id: ItemId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unit price of the undecorated item.
    pub base_price: Decimal,
}

impl MenuItem {
    /// Create a new menu item.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, base_price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_price,
        }
    }
}

/// A selected add-on (extra topping, sauce, size upgrade).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    /// Add-on identifier.
    pub id: AddOnId,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Price added to the item's unit price.
    pub price: Decimal,
}

impl AddOn {
    /// Create an unnamed add-on.
    #[must_use]
    pub fn new(id: impl Into<AddOnId>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            price,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// One distinguishable purchase of a catalog item.
///
/// Several line items may share the same catalog [`ItemId`]; they differ by
/// their add-on set or special instructions (see [`LineSignature`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Catalog identifier (not unique within a cart).
    pub id: ItemId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unit price of the undecorated item.
    pub base_price: Decimal,
    /// Quantity ordered.
    #[serde(default = "default_qty")]
    pub qty: u32,
    /// Selected add-ons, in selection order.
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    /// Free-form kitchen instructions.
    #[serde(default)]
    pub special_instructions: String,
    /// Per-unit price including add-ons, fixed when the line was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_item_price: Option<Decimal>,
}

const fn default_qty() -> u32 {
    1
}

impl LineItem {
    /// Per-unit price: the stored `total_item_price`, or base price plus add-ons.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.total_item_price
            .unwrap_or_else(|| calculate_total_price(self.base_price, &self.add_ons))
    }

    /// Unit price multiplied by quantity, saturating at the `Decimal` range.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price().saturating_mul(Decimal::from(self.qty))
    }

    /// The merge signature of this line.
    #[must_use]
    pub fn signature(&self) -> LineSignature {
        LineSignature::new(&self.id, &self.add_ons, &self.special_instructions)
    }
}

/// Identity of a line item for merging purposes.
///
/// Two additions merge if and only if the catalog id, the sorted list of
/// add-on ids and the special instructions all match. Repeated add-ons count:
/// `[cheese, cheese]` is a different line from `[cheese]`. Instructions are
/// compared verbatim (case and whitespace sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineSignature {
    id: ItemId,
    add_on_ids: Vec<AddOnId>,
    special_instructions: String,
}

impl LineSignature {
    /// Build a signature from its parts.
    #[must_use]
    pub fn new(id: &ItemId, add_ons: &[AddOn], special_instructions: &str) -> Self {
        let mut add_on_ids: Vec<AddOnId> = add_ons.iter().map(|a| a.id.clone()).collect();
        add_on_ids.sort();

        Self {
            id: id.clone(),
            add_on_ids,
            special_instructions: special_instructions.to_owned(),
        }
    }
}
