//! Ordering session identity and the storage key derived from it.
//!
//! A cart belongs to exactly one ordering context at a time: a dine-in table,
//! a take-out customer, or a legacy ticket. The context is reduced to a stable
//! [`SessionKey`] which names the persisted cart blob.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How the current order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    DineIn,
    TakeOut,
}

/// Identity tuple supplied by the authentication collaborator.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub ticket_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_mode: Option<OrderMode>,
}

impl SessionIdentity {
    /// Identity with every field absent.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Dine-in identity for a table.
    #[must_use]
    pub fn table(table_number: impl Into<String>) -> Self {
        Self {
            table_number: Some(table_number.into()),
            order_mode: Some(OrderMode::DineIn),
            ..Self::default()
        }
    }

    /// Take-out identity for a named customer.
    #[must_use]
    pub fn customer(customer_name: impl Into<String>) -> Self {
        Self {
            customer_name: Some(customer_name.into()),
            order_mode: Some(OrderMode::TakeOut),
            ..Self::default()
        }
    }

    /// Legacy ticket identity.
    #[must_use]
    pub fn ticket(ticket_number: impl Into<String>) -> Self {
        Self {
            ticket_number: Some(ticket_number.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if no field identifies an ordering context.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        non_empty(self.table_number.as_deref()).is_none()
            && non_empty(self.customer_name.as_deref()).is_none()
            && non_empty(self.ticket_number.as_deref()).is_none()
    }
}

/// Storage key naming one persisted cart.
///
/// Keys live in the `cart_` namespace:
/// `cart_table_<n>`, `cart_customer_<name>`, `cart_ticket_<n>` or `cart_guest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Key used when no ordering context is known.
    pub const GUEST: &'static str = "cart_guest";

    /// Resolve the key for an identity.
    ///
    /// ```
    /// use tableside_core::{SessionIdentity, SessionKey};
    ///
    /// let key = SessionKey::resolve(&SessionIdentity::customer("Jane Doe"));
    /// assert_eq!(key.as_str(), "cart_customer_jane_doe");
    /// ```
    #[must_use]
    pub fn resolve(identity: &SessionIdentity) -> Self {
        Self(resolve_key(
            identity.table_number.as_deref(),
            identity.ticket_number.as_deref(),
            identity.customer_name.as_deref(),
        ))
    }

    /// Returns `true` for the guest key, which is never persisted.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == Self::GUEST
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the storage key for an identity tuple.
///
/// Priority is table, then customer, then ticket. Customer names are
/// lowercased, whitespace runs become `_` and anything outside `[a-z0-9_]`
/// is dropped.
#[must_use]
pub fn resolve_key(
    table_number: Option<&str>,
    ticket_number: Option<&str>,
    customer_name: Option<&str>,
) -> String {
    if let Some(table) = non_empty(table_number) {
        return format!("cart_table_{table}");
    }
    if let Some(name) = non_empty(customer_name) {
        return format!("cart_customer_{}", normalize_customer_name(name));
    }
    if let Some(ticket) = non_empty(ticket_number) {
        return format!("cart_ticket_{ticket}");
    }
    SessionKey::GUEST.to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn normalize_customer_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            normalized.push(c);
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_wins_over_everything() {
        assert_eq!(
            resolve_key(Some("5"), Some("T-9"), Some("Jane")),
            "cart_table_5"
        );
    }

    #[test]
    fn test_customer_wins_over_ticket() {
        assert_eq!(
            resolve_key(None, Some("T-9"), Some("Jane")),
            "cart_customer_jane"
        );
    }

    #[test]
    fn test_ticket_when_alone() {
        assert_eq!(resolve_key(None, Some("T-9"), None), "cart_ticket_T-9");
    }

    #[test]
    fn test_guest_when_empty() {
        assert_eq!(resolve_key(None, None, None), "cart_guest");
        assert_eq!(resolve_key(Some(""), Some(""), Some("")), "cart_guest");
    }

    #[test]
    fn test_empty_table_falls_through() {
        assert_eq!(resolve_key(Some(""), None, Some("Jane")), "cart_customer_jane");
    }

    #[test]
    fn test_customer_name_normalization() {
        assert_eq!(normalize_customer_name("Jane Doe"), "jane_doe");
        assert_eq!(normalize_customer_name("Jane \t  Doe"), "jane_doe");
        assert_eq!(normalize_customer_name(" Jane"), "_jane");
        assert_eq!(normalize_customer_name("O'Brien-Smith"), "obriensmith");
        assert_eq!(normalize_customer_name("Zoë 2"), "zo_2");
        assert_eq!(normalize_customer_name("snake_case"), "snake_case");
    }

    #[test]
    fn test_resolution_is_stable() {
        let identity = SessionIdentity::customer("Jane Doe");
        assert_eq!(SessionKey::resolve(&identity), SessionKey::resolve(&identity));
    }

    #[test]
    fn test_order_mode_does_not_affect_key() {
        let mut identity = SessionIdentity::table("7");
        let dine_in = SessionKey::resolve(&identity);
        identity.order_mode = Some(OrderMode::TakeOut);
        assert_eq!(SessionKey::resolve(&identity), dine_in);
    }

    #[test]
    fn test_anonymous_identity() {
        assert!(SessionIdentity::anonymous().is_anonymous());
        assert!(
            SessionIdentity {
                table_number: Some(String::new()),
                ..SessionIdentity::default()
            }
            .is_anonymous()
        );
        assert!(!SessionIdentity::ticket("1").is_anonymous());
        assert!(SessionKey::resolve(&SessionIdentity::anonymous()).is_guest());
    }
}
