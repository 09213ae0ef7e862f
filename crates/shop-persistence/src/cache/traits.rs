//! Cache backend contract.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Cache TTL configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub stock: Duration,
    pub search: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            stock: Duration::from_secs(5),
            search: Duration::from_secs(30),
        }
    }
}

/// Key-value store with per-entry expiry.
///
/// A miss, including an expired entry, is `Ok(None)`. `Err` means the
/// backend itself could not be reached.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires `ttl` after this call.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Shared cache handle injected into the services.
pub type SharedCache = Arc<dyn CacheBackend>;

/// Get a JSON value from cache
///
/// # Errors
///
/// Propagates backend errors and fails on undecodable payloads.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheBackend,
    key: &str,
) -> Result<Option<T>> {
    match cache.get(key).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Set a JSON value in cache with TTL
///
/// # Errors
///
/// Propagates backend and serialization errors.
pub async fn set_json<T: Serialize + Sync + ?Sized>(
    cache: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<()> {
    let json = serde_json::to_string(value)?;
    cache.set_with_ttl(key, &json, ttl).await
}
