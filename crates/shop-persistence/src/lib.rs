//! # Storefront Persistence Library
//!
//! Product store access for a small storefront: a cached stock counter, name
//! search with and without index support, and an all-or-nothing batch delete.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorefrontService                        │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐
//! │ StockCacheAside  │ │  ProductSearch   │ │   BatchMutator   │
//! │  (CacheFirst)    │ │ (prefix/substr)  │ │  (transaction)   │
//! └──────────────────┘ └──────────────────┘ └──────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │      CacheBackend       │   │      ProductRepository       │
//! │   (Redis or memory)     │   │  (SQLite or memory; truth)   │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `sqlite`: Enable the SQLite store (default)
//! - `redis`: Enable the Redis cache (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_persistence::{ShopConfig, StorefrontService};
//!
//! let shop = StorefrontService::connect(&ShopConfig::from_env()?).await?;
//! shop.init_stock_product().await?;
//!
//! let stock = shop.get_stock().await?;
//! let hits = shop.find_by_prefix("Guava Dog").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod repository;
pub mod search;
pub mod seed;
pub mod service;
pub mod stock;
pub mod strategy;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use batch::{BatchMutator, BatchOutcome, BatchPhase};
pub use cache::{CacheBackend, CacheTtl, MemoryCache, SharedCache};
#[cfg(feature = "redis")]
pub use cache::{CacheConfig, RedisCache};
pub use config::ShopConfig;
pub use error::{PersistenceError, Result};
pub use repository::{
    MemoryProductRepository, ProductRepository, ProductTransaction, SharedRepository,
};
#[cfg(feature = "sqlite")]
pub use repository::{SqliteConfig, SqliteProductRepository};
pub use search::{MatchMode, ProductSearch, TimedSearch};
pub use seed::{CatalogSeeder, SeedOutcome};
pub use service::StorefrontService;
pub use stock::{StockCacheAside, StockSettings};
pub use strategy::ReadStrategy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
