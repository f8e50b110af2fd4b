//! Newtype IDs for type-safe catalog references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing menu item IDs with add-on IDs.

/// Errors that can occur when parsing an ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty or only whitespace.
    #[error("id cannot be empty")]
    Empty,
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `parse()`, `as_str()`
/// - `Display`, `AsRef<str>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use tableside_core::define_id;
/// define_id!(DishId);
/// define_id!(SauceId);
///
/// let dish = DishId::new("burger");
/// let sauce = SauceId::new("burger");
///
/// // These are different types, so this won't compile:
/// // let _: DishId = sauce;
/// assert_eq!(dish.as_str(), sauce.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID without validation.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parse an ID, rejecting blank input.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Empty`] if the input is empty or whitespace.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                if id.trim().is_empty() {
                    return Err($crate::types::id::IdError::Empty);
                }
                Ok(Self(id.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// Catalog identifiers
define_id!(ItemId);
define_id!(AddOnId);
