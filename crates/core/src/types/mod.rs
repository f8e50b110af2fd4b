//! Core types for Tableside.
//!
//! This module provides type-safe wrappers for the ordering domain.

pub mod id;
pub mod line_item;
pub mod price;
pub mod session;

pub use id::*;
pub use line_item::{AddOn, LineItem, LineSignature, MenuItem};
pub use price::{calculate_total_price, format_price};
pub use session::{OrderMode, SessionIdentity, SessionKey, resolve_key};
