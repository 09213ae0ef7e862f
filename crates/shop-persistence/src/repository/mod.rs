//! # Repository Module
//!
//! Product store contract and its implementations.

pub mod memory_impl;
#[cfg(feature = "sqlite")]
pub mod sqlite_impl;
pub mod traits;

pub use memory_impl::MemoryProductRepository;
#[cfg(feature = "sqlite")]
pub use sqlite_impl::{SqliteConfig, SqliteProductRepository};
pub use traits::{ProductRepository, ProductTransaction, SharedRepository};
