//! # Repository Traits
//!
//! Abstract store interfaces for the product catalog.
//! Implementations can be swapped for different backends (SQLite, in-memory, test fakes).

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use shop_domain::{NewProduct, Product, ProductId};

// =============================================================================
// PRODUCT REPOSITORY
// =============================================================================

/// Repository for Product entity operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Point lookup by exact name equality
    async fn find_one_by_exact_name(&self, name: &str) -> Result<Option<Product>>;

    /// Products whose name starts with `term`, served from the name index
    async fn find_by_prefix(&self, term: &str) -> Result<Vec<Product>>;

    /// Products whose name contains `term` anywhere; a full scan
    async fn find_by_substring(&self, term: &str) -> Result<Vec<Product>>;

    /// Whether any product name contains `term`
    async fn exists_by_substring(&self, term: &str) -> Result<bool>;

    /// Total number of products
    async fn count(&self) -> Result<u64>;

    /// Every product, ordered by id
    async fn list_all(&self) -> Result<Vec<Product>>;

    /// Insert one product and return it with its assigned id
    async fn insert(&self, product: &NewProduct) -> Result<Product>;

    /// Insert many products in one atomic write, returning how many were written
    async fn bulk_insert(&self, products: &[NewProduct]) -> Result<u64>;

    /// Open a transaction for multi-row mutation
    async fn begin(&self) -> Result<Box<dyn ProductTransaction>>;
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// Scoped unit of work.
///
/// Dropping a transaction without calling [`commit`](Self::commit) rolls it
/// back, so every exit path, including cancellation, releases it cleanly.
#[async_trait]
pub trait ProductTransaction: Send {
    /// Point lookup by id inside the transaction
    async fn resolve(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Delete the given rows, returning how many were removed
    async fn delete_many(&mut self, ids: &[ProductId]) -> Result<u64>;

    /// Make every change visible to other readers
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every change
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Shared repository handle injected into the services.
pub type SharedRepository = Arc<dyn ProductRepository>;
