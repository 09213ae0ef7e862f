//! # Strategy Module
//!
//! Enum-based cache/database access strategies using dispatch pattern.
//!
//! ## Read Strategies
//! - `CacheFirst` - Check cache, fall back to DB on miss or cache failure,
//!   then populate the cache (default)
//! - `DbOnly` - Skip cache entirely
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_persistence::strategy::ReadStrategy;
//!
//! let stock = ReadStrategy::CacheFirst
//!     .read(
//!         || read_cached_stock(),
//!         || query_stock(),
//!         |stock| write_cached_stock(stock),
//!     )
//!     .await?;
//! ```

pub mod read_strategy;

pub use read_strategy::ReadStrategy;
