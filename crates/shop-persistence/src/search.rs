//! # Product Search
//!
//! Two query shapes over product names:
//!
//! - **prefix** (`name` starts with `term`): a range scan over the name
//!   index, O(log n + k)
//! - **substring** (`name` contains `term`): no B-tree can serve it, so the
//!   store scans every row, O(n)
//!
//! The timed variants measure wall-clock time around the store call so the
//! difference in index eligibility is observable. An empty term matches the
//! whole catalog in both shapes. Store errors are passed through; retries
//! belong to the store or the caller.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use crate::cache::{SharedCache, get_json, set_json};
use crate::error::Result;
use crate::repository::SharedRepository;
use crate::strategy::ReadStrategy;
use shop_domain::Product;

/// Query shape used for a name search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Prefix,
    Substring,
}

impl MatchMode {
    /// Whether a prefix-ordered index can answer this shape.
    #[must_use]
    pub const fn is_index_eligible(self) -> bool {
        matches!(self, Self::Prefix)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Substring => "substring",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search results together with how long the store took to produce them
#[derive(Debug, Clone)]
pub struct TimedSearch {
    pub mode: MatchMode,
    pub term: String,
    pub products: Vec<Product>,
    pub elapsed: Duration,
}

impl TimedSearch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }
}

/// Name search over the product catalog
#[derive(Clone)]
pub struct ProductSearch {
    repo: SharedRepository,
    cache: Option<SharedCache>,
    cache_ttl: Duration,
}

impl ProductSearch {
    pub const fn new(repo: SharedRepository) -> Self {
        Self {
            repo,
            cache: None,
            cache_ttl: Duration::ZERO,
        }
    }

    /// Enable [`find_by_substring_cached`](Self::find_by_substring_cached).
    #[must_use]
    pub fn with_cache(mut self, cache: SharedCache, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Products whose name starts with `term`.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_prefix(&self, term: &str) -> Result<Vec<Product>> {
        self.repo.find_by_prefix(term).await
    }

    /// Products whose name contains `term`.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_substring(&self, term: &str) -> Result<Vec<Product>> {
        self.repo.find_by_substring(term).await
    }

    /// Dispatch on the query shape.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find(&self, mode: MatchMode, term: &str) -> Result<Vec<Product>> {
        match mode {
            MatchMode::Prefix => self.find_by_prefix(term).await,
            MatchMode::Substring => self.find_by_substring(term).await,
        }
    }

    /// Run one search and measure it.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_timed(&self, mode: MatchMode, term: &str) -> Result<TimedSearch> {
        let started = Instant::now();
        let products = self.find(mode, term).await?;
        let timed = TimedSearch {
            mode,
            term: term.to_string(),
            products,
            elapsed: started.elapsed(),
        };

        tracing::debug!(
            mode = %mode,
            term,
            indexed = mode.is_index_eligible(),
            rows = timed.len(),
            elapsed_ms = timed.elapsed_ms(),
            "Name search"
        );

        Ok(timed)
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_prefix_timed(&self, term: &str) -> Result<TimedSearch> {
        self.find_timed(MatchMode::Prefix, term).await
    }

    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_substring_timed(&self, term: &str) -> Result<TimedSearch> {
        self.find_timed(MatchMode::Substring, term).await
    }

    /// Substring search served from cache while a result for `term` is live.
    ///
    /// Same staleness rules as the stock counter: no invalidation on write,
    /// cache errors fall through to the store. Without a cache configured
    /// this is a plain [`find_by_substring`](Self::find_by_substring).
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_by_substring_cached(&self, term: &str) -> Result<Vec<Product>> {
        let Some(cache) = &self.cache else {
            return self.find_by_substring(term).await;
        };
        let key = format!("search:substring:{term}");
        let key = key.as_str();

        ReadStrategy::CacheFirst
            .read(
                || get_json::<Vec<Product>>(cache.as_ref(), key),
                || self.find_by_substring(term),
                |products| async move {
                    set_json(cache.as_ref(), key, &products, self.cache_ttl).await
                },
            )
            .await
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn count(&self) -> Result<u64> {
        self.repo.count().await
    }

    /// Every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        self.repo.list_all().await
    }
}
