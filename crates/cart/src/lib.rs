//! Tableside Cart - Session-scoped cart store.
//!
//! Keeps one shopping cart per ordering session (table, take-out customer or
//! legacy ticket), switches carts when the session identity changes, merges
//! duplicate line items and recomputes totals under a discount.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the in-memory cart and drives the session state machine
//! - [`CartStorage`] persists serialized carts by session key
//! - [`DiscountService`] validates codes and computes discount effects
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tableside_cart::{CartStore, MemoryStorage, PromotionBook, StoreOptions};
//! use tableside_core::{MenuItem, SessionIdentity};
//!
//! let store = CartStore::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(PromotionBook::default()),
//!     StoreOptions::default(),
//! );
//!
//! store.observe_session(&SessionIdentity::table("5"));
//! store.wait_loaded().await;
//! store.add_item(&MenuItem::new("pho", "Pho", price), AddItemOptions::default());
//! let totals = store.totals();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blob;
pub mod discount;
pub mod storage;
pub mod store;

pub use blob::{BlobError, PersistedCart};
pub use discount::{
    CachedDiscounts, DiscountEffect, DiscountError, DiscountOutcome, DiscountRecord,
    DiscountService, Promotion, PromotionBook, PromotionKind,
};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{AddItemOptions, CartState, CartStore, CartTotals, LoadPhase, StoreOptions};
