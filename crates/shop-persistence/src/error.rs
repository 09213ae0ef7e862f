//! Persistence layer error types

use thiserror::Error;

use crate::batch::BatchPhase;
use shop_domain::DomainError;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transaction failed while {phase}, rolled back: {source}")]
    TransactionFailed {
        phase: BatchPhase,
        #[source]
        source: Box<PersistenceError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl PersistenceError {
    /// True for errors raised by a cache backend, which callers on the
    /// cache-aside paths swallow.
    #[must_use]
    pub const fn is_cache_error(&self) -> bool {
        matches!(self, Self::Redis(_) | Self::CacheUnavailable(_))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for PersistenceError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
