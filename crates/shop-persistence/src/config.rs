//! # Storefront Configuration
//!
//! Environment-based configuration for the store, cache and stock counter.
//!
//! | Variable                   | Default              |
//! |----------------------------|----------------------|
//! | `DATABASE_URL`             | `sqlite::memory:`    |
//! | `DATABASE_MAX_CONNECTIONS` | `5`                  |
//! | `REDIS_URL`                | unset (memory cache) |
//! | `REDIS_CONNECT_TIMEOUT_MS` | `2000`               |
//! | `STOCK_PRODUCT_NAME`       | `Welfare Bear Plush` |
//! | `STOCK_CACHE_TTL_SECS`     | `5`                  |
//! | `SEARCH_CACHE_TTL_SECS`    | `30`                 |
//! | `STORE_LATENCY_MS`         | `0`                  |
//! | `LOG_LEVEL`                | `info`               |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheTtl;
use crate::error::{PersistenceError, Result};
use crate::stock::{DEFAULT_STOCK_PRODUCT, StockSettings};

#[cfg(feature = "redis")]
use crate::cache::CacheConfig;
#[cfg(feature = "sqlite")]
use crate::repository::SqliteConfig;

/// Storefront configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// sqlx connection URL of the product store
    pub database_url: String,

    pub database_max_connections: u32,

    /// Redis URL; `None` selects the in-process cache
    pub redis_url: Option<String>,

    /// How long to wait for Redis before falling back to the memory cache
    pub redis_connect_timeout: Duration,

    /// Product whose stock the counter reports
    pub stock_product: String,

    pub stock_cache_ttl: Duration,

    pub search_cache_ttl: Duration,

    /// Artificial delay before each stock read from the store
    pub store_latency: Duration,

    /// Default tracing filter directive
    pub log_level: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 5,
            redis_url: None,
            redis_connect_timeout: Duration::from_secs(2),
            stock_product: DEFAULT_STOCK_PRODUCT.to_string(),
            stock_cache_ttl: Duration::from_secs(5),
            search_cache_ttl: Duration::from_secs(30),
            store_latency: Duration::ZERO,
            log_level: "info".to_string(),
        }
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::InvalidConfig`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::InvalidConfig`] if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_or(
                &get,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            redis_url: get("REDIS_URL"),
            redis_connect_timeout: Duration::from_millis(parse_or(
                &get,
                "REDIS_CONNECT_TIMEOUT_MS",
                u64::try_from(defaults.redis_connect_timeout.as_millis()).unwrap_or(u64::MAX),
            )?),
            stock_product: get("STOCK_PRODUCT_NAME").unwrap_or(defaults.stock_product),
            stock_cache_ttl: Duration::from_secs(parse_or(
                &get,
                "STOCK_CACHE_TTL_SECS",
                defaults.stock_cache_ttl.as_secs(),
            )?),
            search_cache_ttl: Duration::from_secs(parse_or(
                &get,
                "SEARCH_CACHE_TTL_SECS",
                defaults.search_cache_ttl.as_secs(),
            )?),
            store_latency: Duration::from_millis(parse_or(&get, "STORE_LATENCY_MS", 0)?),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    #[must_use]
    pub const fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            stock: self.stock_cache_ttl,
            search: self.search_cache_ttl,
        }
    }

    #[must_use]
    pub fn stock_settings(&self) -> StockSettings {
        StockSettings {
            product_name: self.stock_product.clone(),
            ttl: self.stock_cache_ttl,
            store_latency: self.store_latency,
        }
    }

    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteConfig {
        SqliteConfig {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    /// Redis settings, if a Redis URL is configured.
    #[cfg(feature = "redis")]
    #[must_use]
    pub fn cache_config(&self) -> Option<CacheConfig> {
        self.redis_url.as_ref().map(|url| CacheConfig {
            url: url.clone(),
            connect_timeout: self.redis_connect_timeout,
            ..CacheConfig::default()
        })
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| PersistenceError::InvalidConfig(format!("{key}={raw}: {e}")))
    })
}
