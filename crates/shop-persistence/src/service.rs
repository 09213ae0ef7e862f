//! # Storefront Service
//!
//! Facade bundling the stock counter, name search, batch mutator and seeder
//! over one shared store and cache.

use std::sync::Arc;

use crate::batch::{BatchMutator, BatchOutcome};
use crate::cache::{MemoryCache, SharedCache};
use crate::config::ShopConfig;
use crate::error::Result;
use crate::repository::SharedRepository;
use crate::search::{ProductSearch, TimedSearch};
use crate::seed::{CatalogSeeder, SeedOutcome};
use crate::stock::StockCacheAside;
use shop_domain::{Product, ProductId};

/// Storefront operations over one store and one cache
#[derive(Clone)]
pub struct StorefrontService {
    repo: SharedRepository,
    cache: SharedCache,
    stock: StockCacheAside,
    search: ProductSearch,
    batch: BatchMutator,
    seeder: CatalogSeeder,
}

impl StorefrontService {
    /// Wire the components over an existing store and cache.
    pub fn new(repo: SharedRepository, cache: SharedCache, config: &ShopConfig) -> Self {
        Self {
            stock: StockCacheAside::with_settings(
                Arc::clone(&repo),
                Arc::clone(&cache),
                config.stock_settings(),
            ),
            search: ProductSearch::new(Arc::clone(&repo))
                .with_cache(Arc::clone(&cache), config.cache_ttl().search),
            batch: BatchMutator::new(Arc::clone(&repo)),
            seeder: CatalogSeeder::for_product(Arc::clone(&repo), config.stock_product.as_str()),
            repo,
            cache,
        }
    }

    /// Open the SQLite store and the configured cache.
    ///
    /// Uses Redis when `redis_url` is set, the in-process cache otherwise.
    /// A Redis that cannot be reached within `redis_connect_timeout` is
    /// logged and replaced by the in-process cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    #[cfg(feature = "sqlite")]
    pub async fn connect(config: &ShopConfig) -> Result<Self> {
        use crate::repository::SqliteProductRepository;

        let repo: SharedRepository =
            Arc::new(SqliteProductRepository::connect(&config.sqlite_config()).await?);
        let cache = connect_cache(config).await;

        Ok(Self::new(repo, cache, config))
    }

    pub const fn repository(&self) -> &SharedRepository {
        &self.repo
    }

    pub const fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub const fn stock(&self) -> &StockCacheAside {
        &self.stock
    }

    pub const fn search(&self) -> &ProductSearch {
        &self.search
    }

    pub const fn batch(&self) -> &BatchMutator {
        &self.batch
    }

    pub const fn seeder(&self) -> &CatalogSeeder {
        &self.seeder
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn get_stock(&self) -> Result<u32> {
        self.stock.get_stock().await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn get_stock_uncached(&self) -> Result<u32> {
        self.stock.get_stock_uncached().await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_prefix(&self, term: &str) -> Result<TimedSearch> {
        self.search.find_by_prefix_timed(term).await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_substring(&self, term: &str) -> Result<TimedSearch> {
        self.search.find_by_substring_timed(term).await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_substring_cached(&self, term: &str) -> Result<Vec<Product>> {
        self.search.find_by_substring_cached(term).await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn count(&self) -> Result<u64> {
        self.search.count().await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        self.search.list_all().await
    }

    /// # Errors
    ///
    /// See [`BatchMutator::delete_batch_detailed`].
    pub async fn delete_batch(&self, ids: &[ProductId]) -> Result<BatchOutcome> {
        self.batch.delete_batch_detailed(ids).await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn init_stock_product(&self) -> Result<SeedOutcome> {
        self.seeder.init_stock_product().await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn seed_catalog(&self, per_character: u32) -> Result<SeedOutcome> {
        self.seeder.seed_catalog(per_character).await
    }
}

#[cfg(feature = "sqlite")]
async fn connect_cache(config: &ShopConfig) -> SharedCache {
    #[cfg(feature = "redis")]
    if let Some(cache_config) = config.cache_config() {
        match crate::cache::RedisCache::new(cache_config).await {
            Ok(redis) => return Arc::new(redis),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unreachable, falling back to memory cache");
                return Arc::new(MemoryCache::new());
            }
        }
    }

    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL set but built without redis support, using memory cache");
    } else {
        tracing::info!("No REDIS_URL, using memory cache");
    }
    Arc::new(MemoryCache::new())
}
