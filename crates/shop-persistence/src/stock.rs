//! # Stock Cache-Aside
//!
//! Read-through cache for the stock count of one well-known product.
//!
//! ```text
//! get_stock()
//!   ├─ cache.get("product_stock") ── live ──▶ return
//!   └─ miss / cache error
//!        ├─ store.find_one_by_exact_name(name)   (no row → 0)
//!        ├─ cache.set_with_ttl("product_stock", stock, ttl)   (errors dropped)
//!        └─ return
//! ```
//!
//! Writes elsewhere never invalidate the entry, so a reader may see a value
//! up to one TTL old. Concurrent misses each query the store and overwrite
//! the entry with the same value; there is no single-flight lock.

use std::time::Duration;

use crate::cache::SharedCache;
use crate::error::{PersistenceError, Result};
use crate::repository::SharedRepository;
use crate::strategy::ReadStrategy;

/// Cache key holding the stock count.
pub const STOCK_CACHE_KEY: &str = "product_stock";

/// Product whose row is the stock counter's source of truth.
pub const DEFAULT_STOCK_PRODUCT: &str = "Welfare Bear Plush";

/// Stock the product is seeded with.
pub const STOCK_SEED_LEVEL: u32 = 1000;

/// Stock counter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSettings {
    pub product_name: String,
    pub ttl: Duration,
    /// Awaited before every store read on the stock path. Makes the cache's
    /// latency benefit visible against a fast embedded store.
    pub store_latency: Duration,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_STOCK_PRODUCT.to_string(),
            ttl: Duration::from_secs(5),
            store_latency: Duration::ZERO,
        }
    }
}

/// Cache-aside reader for the stock counter
#[derive(Clone)]
pub struct StockCacheAside {
    repo: SharedRepository,
    cache: SharedCache,
    settings: StockSettings,
}

impl StockCacheAside {
    /// Create with default settings.
    pub fn new(repo: SharedRepository, cache: SharedCache) -> Self {
        Self::with_settings(repo, cache, StockSettings::default())
    }

    pub const fn with_settings(
        repo: SharedRepository,
        cache: SharedCache,
        settings: StockSettings,
    ) -> Self {
        Self {
            repo,
            cache,
            settings,
        }
    }

    pub const fn settings(&self) -> &StockSettings {
        &self.settings
    }

    /// Current stock, served from cache while the entry is live.
    ///
    /// # Errors
    ///
    /// Only store errors surface; cache errors degrade to a store read.
    pub async fn get_stock(&self) -> Result<u32> {
        self.read(ReadStrategy::CacheFirst).await
    }

    /// Current stock straight from the store, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn get_stock_uncached(&self) -> Result<u32> {
        self.read(ReadStrategy::DbOnly).await
    }

    async fn read(&self, strategy: ReadStrategy) -> Result<u32> {
        strategy
            .read(
                || self.read_cached(),
                || self.load_from_store(),
                |stock| self.write_cached(stock),
            )
            .await
    }

    async fn read_cached(&self) -> Result<Option<u32>> {
        let Some(raw) = self.cache.get(STOCK_CACHE_KEY).await? else {
            return Ok(None);
        };
        raw.parse().map(Some).map_err(|_| {
            PersistenceError::Serialization(format!("Cached stock '{raw}' is not a count"))
        })
    }

    async fn load_from_store(&self) -> Result<u32> {
        if !self.settings.store_latency.is_zero() {
            tokio::time::sleep(self.settings.store_latency).await;
        }

        let stock = self
            .repo
            .find_one_by_exact_name(&self.settings.product_name)
            .await?
            .map_or(0, |product| product.stock);

        tracing::debug!(product = %self.settings.product_name, stock, "Loaded stock from store");
        Ok(stock)
    }

    async fn write_cached(&self, stock: u32) -> Result<()> {
        self.cache
            .set_with_ttl(STOCK_CACHE_KEY, &stock.to_string(), self.settings.ttl)
            .await
    }
}
