//! # Redis Cache Layer
//!
//! Redis-backed [`CacheBackend`] for sharing cached values between processes.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

use super::traits::CacheBackend;
use crate::error::{PersistenceError, Result};

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// Prepended to every key so several apps can share one Redis.
    pub key_prefix: String,
    /// Upper bound on the initial connect; the connection manager's own
    /// retries would otherwise run for minutes.
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "storefront:".to_string(),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Redis cache client with a multiplexed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    config: CacheConfig,
}

impl RedisCache {
    /// Create a new cache client
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                PersistenceError::CacheUnavailable(format!(
                    "no connection to {} within {:?}",
                    config.url, config.connect_timeout
                ))
            })??;
        tracing::info!(url = %config.url, "Redis cache connected");

        Ok(Self { conn, config })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.config.key_prefix)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let mut conn = self.conn.clone();
        // PSETEX rejects a zero expiry; the old value is cleared instead.
        if millis == 0 {
            let _: () = conn.del(self.namespaced(key)).await?;
            return Ok(());
        }
        let _: () = conn.pset_ex(self.namespaced(key), value, millis).await?;
        Ok(())
    }
}
