//! In-memory promotion codes.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DiscountEffect, DiscountError, DiscountRecord, DiscountService, normalize_code};

/// How a promotion reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PromotionKind {
    /// Percentage of the subtotal (e.g., `10` for 10% off).
    Percentage(Decimal),
    /// Fixed amount off the subtotal.
    FixedAmount(Decimal),
}

/// A promotion code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub code: String,
    pub kind: PromotionKind,
    /// Subtotal below which the promotion has no effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_subtotal: Option<Decimal>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl Promotion {
    /// Active percentage promotion.
    #[must_use]
    pub fn percentage(code: impl Into<String>, percent: Decimal) -> Self {
        Self {
            code: code.into(),
            kind: PromotionKind::Percentage(percent),
            min_subtotal: None,
            active: true,
        }
    }

    /// Active fixed-amount promotion.
    #[must_use]
    pub fn fixed_amount(code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            code: code.into(),
            kind: PromotionKind::FixedAmount(amount),
            min_subtotal: None,
            active: true,
        }
    }

    /// Require a minimum subtotal.
    #[must_use]
    pub const fn with_min_subtotal(mut self, min_subtotal: Decimal) -> Self {
        self.min_subtotal = Some(min_subtotal);
        self
    }

    /// Discount this promotion grants on `subtotal`, clamped to `[0, subtotal]`
    /// and rounded to cents.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if self.min_subtotal.is_some_and(|min| subtotal < min) {
            return Decimal::ZERO;
        }

        let raw = match self.kind {
            PromotionKind::Percentage(percent) => subtotal
                .checked_mul(percent)
                .map_or_else(
                    || (subtotal / Decimal::ONE_HUNDRED).saturating_mul(percent),
                    |scaled| scaled / Decimal::ONE_HUNDRED,
                ),
            PromotionKind::FixedAmount(amount) => amount,
        };

        raw.clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO))
            .round_dp(2)
    }
}

/// Promotion codes held in memory, looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct PromotionBook {
    promotions: HashMap<String, Promotion>,
}

impl PromotionBook {
    /// Build a book from a list of promotions. Later duplicates win.
    #[must_use]
    pub fn new(promotions: impl IntoIterator<Item = Promotion>) -> Self {
        let mut book = Self::default();
        for promotion in promotions {
            book.insert(promotion);
        }
        book
    }

    /// Parse a JSON array of promotions.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::InvalidRecord`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, DiscountError> {
        let promotions: Vec<Promotion> = serde_json::from_str(json)?;
        Ok(Self::new(promotions))
    }

    /// Add or replace a promotion.
    pub fn insert(&mut self, promotion: Promotion) {
        self.promotions
            .insert(normalize_code(&promotion.code), promotion);
    }

    /// Number of promotions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Returns `true` if the book holds no promotions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

#[async_trait]
impl DiscountService for PromotionBook {
    async fn lookup(&self, code: &str) -> Result<Option<DiscountRecord>, DiscountError> {
        let Some(promotion) = self.promotions.get(&normalize_code(code)) else {
            return Ok(None);
        };
        if !promotion.active {
            return Ok(None);
        }

        Ok(Some(DiscountRecord::new(serde_json::to_value(promotion)?)))
    }

    fn apply(&self, discount: &DiscountRecord, subtotal: Decimal) -> DiscountEffect {
        match Promotion::deserialize(discount.as_value()) {
            Ok(promotion) => {
                let discount_amount = promotion.discount_for(subtotal);
                DiscountEffect {
                    discount_amount,
                    final_total: subtotal - discount_amount,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unrecognized discount record");
                DiscountEffect::none(subtotal)
            }
        }
    }
}
