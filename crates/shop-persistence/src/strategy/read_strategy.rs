//! Read strategy implementations using enum dispatch.

use std::fmt::Debug;
use std::future::Future;

use crate::error::Result;

/// Read strategy enum - determines cache/db access pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Check cache first, fall back to DB on miss
    #[default]
    CacheFirst,
    /// Only read from database, skip cache
    DbOnly,
}

impl ReadStrategy {
    /// Execute a read operation according to the strategy.
    ///
    /// - `cache_fn`: Async function to read from cache
    /// - `db_fn`: Async function to read from database
    /// - `populate_fn`: Async function to populate cache after a DB read
    ///
    /// Cache errors never escape: a failed cache read is a miss and a failed
    /// populate is logged and dropped. Database errors propagate unchanged.
    pub async fn read<T, CacheFut, DbFut, PopulateFut>(
        &self,
        cache_fn: impl FnOnce() -> CacheFut,
        db_fn: impl FnOnce() -> DbFut,
        populate_fn: impl FnOnce(T) -> PopulateFut,
    ) -> Result<T>
    where
        T: Clone + Debug,
        CacheFut: Future<Output = Result<Option<T>>>,
        DbFut: Future<Output = Result<T>>,
        PopulateFut: Future<Output = Result<()>>,
    {
        match self {
            Self::CacheFirst => {
                match cache_fn().await {
                    Ok(Some(value)) => {
                        tracing::debug!("Cache hit");
                        return Ok(value);
                    }
                    Ok(None) => {
                        tracing::debug!("Cache miss, falling back to DB");
                    }
                    Err(e) if e.is_cache_error() => {
                        tracing::warn!(error = %e, "Cache unavailable, falling back to DB");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Unreadable cache entry, treating as miss");
                    }
                }

                let value = db_fn().await?;

                if let Err(e) = populate_fn(value.clone()).await {
                    tracing::warn!(error = %e, "Failed to populate cache");
                }

                Ok(value)
            }

            Self::DbOnly => db_fn().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn no_populate(_: i32) -> Result<()> {
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_first_hit() {
        let db_called = Arc::new(AtomicBool::new(false));
        let flag = db_called.clone();

        let result = ReadStrategy::CacheFirst
            .read(
                || async { Ok(Some(42)) },
                || async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(99)
                },
                no_populate,
            )
            .await
            .unwrap();

        assert_eq!(result, 42); // Should return cache value
        assert!(!db_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cache_first_miss_populates() {
        let populated = Arc::new(std::sync::Mutex::new(None));
        let sink = populated.clone();

        let result = ReadStrategy::CacheFirst
            .read(
                || async { Ok(None) },
                || async { Ok(99) },
                |value| async move {
                    *sink.lock().unwrap() = Some(value);
                    Ok(())
                },
            )
            .await
            .unwrap();

        assert_eq!(result, 99); // Should return DB value
        assert_eq!(*populated.lock().unwrap(), Some(99));
    }

    #[tokio::test]
    async fn test_cache_error_is_a_miss() {
        let result = ReadStrategy::CacheFirst
            .read(
                || async { Err(PersistenceError::CacheUnavailable("down".into())) },
                || async { Ok(7) },
                |_| async { Err(PersistenceError::CacheUnavailable("down".into())) },
            )
            .await
            .unwrap();

        assert_eq!(result, 7);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let corrupt = PersistenceError::Serialization("expected integer".into());
        assert!(!corrupt.is_cache_error());

        let result = ReadStrategy::CacheFirst
            .read(move || async move { Err(corrupt) }, || async { Ok(3) }, no_populate)
            .await
            .unwrap();

        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn test_db_error_propagates() {
        let result = ReadStrategy::CacheFirst
            .read(
                || async { Ok(None) },
                || async { Err::<i32, _>(PersistenceError::Database("gone".into())) },
                no_populate,
            )
            .await;

        assert!(matches!(result, Err(PersistenceError::Database(_))));
    }

    #[tokio::test]
    async fn test_db_only() {
        let result = ReadStrategy::DbOnly
            .read(|| async { Ok(Some(42)) }, || async { Ok(99) }, no_populate)
            .await
            .unwrap();

        assert_eq!(result, 99); // Should skip cache
    }
}
