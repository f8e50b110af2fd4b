//! Integration tests for Tableside.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tableside-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_switching` - Key changes, reloads and anonymous sessions
//! - `load_races` - Mutations and session changes while a load is in flight
//! - `persistence` - File storage, malformed blobs and failing backends
//! - `discounts` - Discount codes through the store
//!
//! This library holds the shared fixtures: storage and discount doubles and
//! store builders.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::watch;

use tableside_cart::{
    CartStorage, CartStore, DiscountEffect, DiscountError, DiscountRecord, DiscountService,
    MemoryStorage, Promotion, PromotionBook, StorageError, StoreOptions,
};
use tableside_core::MenuItem;

/// Promotion codes used across tests.
#[must_use]
pub fn promotions() -> PromotionBook {
    PromotionBook::new([
        Promotion::percentage("SAVE10", Decimal::from(10)),
        Promotion::fixed_amount("FIVEOFF", Decimal::from(5)),
    ])
}

/// Store over `storage` with the test promotions and no write debounce.
#[must_use]
pub fn store_over(storage: Arc<dyn CartStorage>) -> CartStore {
    store_with(storage, Arc::new(promotions()), Duration::ZERO)
}

/// Store with explicit collaborators.
#[must_use]
pub fn store_with(
    storage: Arc<dyn CartStorage>,
    discounts: Arc<dyn DiscountService>,
    persist_debounce: Duration,
) -> CartStore {
    CartStore::new(storage, discounts, StoreOptions { persist_debounce })
}

/// Menu item with a whole-number price.
#[must_use]
pub fn menu_item(id: &str, price: i64) -> MenuItem {
    MenuItem::new(id, format!("Item {id}"), Decimal::from(price))
}

/// Memory storage whose reads block while the gate is held.
///
/// Also counts reads, so tests can assert that no reload happened.
#[derive(Debug, Clone)]
pub struct GatedStorage {
    inner: MemoryStorage,
    open: Arc<watch::Sender<bool>>,
    reads: Arc<AtomicUsize>,
}

impl Default for GatedStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl GatedStorage {
    /// Create an open gate over empty storage.
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self {
            inner: MemoryStorage::new(),
            open: Arc::new(open),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make subsequent reads wait.
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    /// Let waiting and future reads through.
    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Number of reads started so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// The backing memory storage.
    #[must_use]
    pub const fn memory(&self) -> &MemoryStorage {
        &self.inner
    }
}

#[async_trait]
impl CartStorage for GatedStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.open.subscribe();
        let _ = rx.wait_for(|open| *open).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, blob: String) -> Result<(), StorageError> {
        self.inner.set(key, blob).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

/// Storage where every call fails.
#[derive(Debug, Default)]
pub struct FailingStorage;

#[async_trait]
impl CartStorage for FailingStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }

    async fn set(&self, _key: &str, _blob: String) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }
}

/// Discount service whose lookups always fail.
#[derive(Debug, Default)]
pub struct FailingDiscounts;

#[async_trait]
impl DiscountService for FailingDiscounts {
    async fn lookup(&self, _code: &str) -> Result<Option<DiscountRecord>, DiscountError> {
        Err(DiscountError::Unavailable("connection refused".to_string()))
    }

    fn apply(&self, _discount: &DiscountRecord, subtotal: Decimal) -> DiscountEffect {
        DiscountEffect::none(subtotal)
    }
}
