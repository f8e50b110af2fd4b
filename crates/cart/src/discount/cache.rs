//! Lookup cache in front of a discount service.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::{DiscountEffect, DiscountError, DiscountRecord, DiscountService, normalize_code};

/// Caches successful lookups of the wrapped service.
///
/// Misses and errors are not cached, so a newly created code becomes usable
/// immediately.
pub struct CachedDiscounts<S> {
    inner: S,
    cache: Cache<String, DiscountRecord>,
}

impl<S: DiscountService> CachedDiscounts<S> {
    /// Wrap `inner`, keeping hits for `ttl`.
    #[must_use]
    pub fn new(inner: S, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    /// The wrapped service.
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DiscountService> DiscountService for CachedDiscounts<S> {
    #[instrument(skip(self))]
    async fn lookup(&self, code: &str) -> Result<Option<DiscountRecord>, DiscountError> {
        let key = normalize_code(code);

        if let Some(record) = self.cache.get(&key).await {
            debug!("Discount cache hit");
            return Ok(Some(record));
        }

        let record = self.inner.lookup(code).await?;
        if let Some(record) = &record {
            self.cache.insert(key, record.clone()).await;
        }
        Ok(record)
    }

    fn apply(&self, discount: &DiscountRecord, subtotal: Decimal) -> DiscountEffect {
        self.inner.apply(discount, subtotal)
    }
}
