//! # Cache Module
//!
//! Key-value cache backends with per-entry expiry. The stock counter and the
//! cached search path only ever talk to [`CacheBackend`], so Redis and the
//! in-process cache are interchangeable.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_client;
pub mod traits;

pub use memory::{CacheEntry, MemoryCache};
#[cfg(feature = "redis")]
pub use redis_client::{CacheConfig, RedisCache};
pub use traits::{CacheBackend, CacheTtl, SharedCache, get_json, set_json};
