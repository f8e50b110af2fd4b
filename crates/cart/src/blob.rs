//! Persisted cart blob format.
//!
//! A cart is stored as a JSON object:
//!
//! ```json
//! { "items": [...], "discount": {...} | null, "discountCode": "SAVE10", "timestamp": 1760000000000 }
//! ```
//!
//! Decoding is field-by-field and forgiving: a field that fails its check
//! falls back to the empty default instead of rejecting the whole cart. Only
//! a blob that is not a JSON object at all is an error.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use tableside_core::LineItem;

use crate::discount::DiscountRecord;
use crate::store::CartState;

/// Errors that can occur when encoding or decoding a cart blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// JSON encoding or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blob parsed but is not a JSON object.
    #[error("cart blob must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Serialized view of a cart, as written to storage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart<'a> {
    pub items: &'a [LineItem],
    pub discount: Option<&'a DiscountRecord>,
    pub discount_code: &'a str,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl<'a> PersistedCart<'a> {
    /// Borrow a cart state for writing, stamped with the current time.
    #[must_use]
    pub fn from_state(state: &'a CartState) -> Self {
        Self {
            items: &state.items,
            discount: state.discount.as_ref(),
            discount_code: &state.discount_code,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Serialize to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String, BlobError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode a stored blob into a cart state.
///
/// - `items` is adopted only if it is an array of valid line items
/// - `discount` is adopted only if truthy
/// - `discountCode` is adopted only if it is a non-empty string
///
/// # Errors
///
/// Returns an error if the blob is not valid JSON or not a JSON object.
pub fn decode(blob: &str) -> Result<CartState, BlobError> {
    let value: Value = serde_json::from_str(blob)?;
    let Value::Object(mut fields) = value else {
        return Err(BlobError::NotAnObject(json_type(&value)));
    };

    let mut state = CartState::default();

    if let Some(items) = fields.remove("items") {
        if items.is_array() {
            match serde_json::from_value::<Vec<LineItem>>(items) {
                Ok(items) => state.items = items,
                Err(e) => tracing::warn!(error = %e, "Discarding malformed cart items"),
            }
        } else {
            tracing::warn!(found = json_type(&items), "Cart items is not an array");
        }
    }

    if let Some(discount) = fields.remove("discount")
        && is_truthy(&discount)
    {
        state.discount = Some(DiscountRecord::new(discount));
    }

    if let Some(Value::String(code)) = fields.remove("discountCode")
        && !code.is_empty()
    {
        state.discount_code = code;
    }

    Ok(state)
}

/// JavaScript-style truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
