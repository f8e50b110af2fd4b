//! Discount collaborator contract.
//!
//! The cart store never interprets a discount itself. It asks a
//! [`DiscountService`] to look a code up, keeps the returned
//! [`DiscountRecord`] as opaque data, and hands it back to
//! [`DiscountService::apply`] whenever totals are computed.
//!
//! # Implementations
//!
//! - [`PromotionBook`] - in-memory table of promotion codes
//! - [`CachedDiscounts`] - `moka` cache in front of any service

mod cache;
mod promotion;

pub use cache::CachedDiscounts;
pub use promotion::{Promotion, PromotionBook, PromotionKind};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when looking a discount up.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// The discount backend could not be reached.
    #[error("Discount service unavailable: {0}")]
    Unavailable(String),

    /// The backend returned a record that cannot be used.
    #[error("Invalid discount record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

/// Opaque discount data returned by a [`DiscountService`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountRecord(serde_json::Value);

impl DiscountRecord {
    /// Wrap a raw record.
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the raw record.
    #[must_use]
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Result of applying a discount to a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountEffect {
    pub discount_amount: Decimal,
    pub final_total: Decimal,
}

impl DiscountEffect {
    /// No discount: the final total equals the subtotal.
    #[must_use]
    pub const fn none(subtotal: Decimal) -> Self {
        Self {
            discount_amount: Decimal::ZERO,
            final_total: subtotal,
        }
    }
}

/// Outcome of applying a discount code to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountOutcome {
    /// The code was accepted and the record is now active.
    Applied(DiscountRecord),
    /// The code was rejected; the cart has no discount.
    Rejected {
        /// Human-readable reason, suitable for display.
        reason: String,
    },
}

impl DiscountOutcome {
    /// Returns `true` if the code was accepted.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Validates discount codes and computes their effect.
#[async_trait]
pub trait DiscountService: Send + Sync {
    /// Look a code up.
    ///
    /// Returns `Ok(None)` if the code does not exist or is not usable.
    async fn lookup(&self, code: &str) -> Result<Option<DiscountRecord>, DiscountError>;

    /// Compute the discount for `subtotal`. Must be pure.
    fn apply(&self, discount: &DiscountRecord, subtotal: Decimal) -> DiscountEffect;
}

/// Normalized form of a code used for lookups and storage.
pub(crate) fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
