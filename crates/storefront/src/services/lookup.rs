//! Cached product lookups for cart validation.
//!
//! Only hits are cached: a product created right after a miss must be
//! addable immediately. A cached hit outlives its product for up to the TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;

use threadline_core::ProductId;

use crate::db::{Database, ProductRepository, RepositoryError};

/// Product existence and price lookup with a one-minute TTL.
#[derive(Clone)]
pub struct ProductLookup {
    cache: Arc<Cache<ProductId, Decimal>>,
}

impl Default for ProductLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductLookup {
    /// Create an empty lookup cache.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(60))
            .build();
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Current unit price of a product, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the uncached lookup fails.
    pub async fn price_of(
        &self,
        db: &Database,
        id: ProductId,
    ) -> Result<Option<Decimal>, RepositoryError> {
        if let Some(price) = self.cache.get(&id).await {
            return Ok(Some(price));
        }

        let price = ProductRepository::new(db).get(id).await?.map(|p| p.price);
        if let Some(price) = price {
            self.cache.insert(id, price).await;
        }
        Ok(price)
    }

    /// Whether the product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the uncached lookup fails.
    pub async fn exists(&self, db: &Database, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.price_of(db, id).await?.is_some())
    }

    #[cfg(test)]
    pub(crate) async fn invalidate(&self, id: ProductId) {
        self.cache.invalidate(&id).await;
    }
}
