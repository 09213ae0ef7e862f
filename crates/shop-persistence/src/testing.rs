//! Test doubles for the store and cache contracts.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::error::{PersistenceError, Result};
use crate::repository::{MemoryProductRepository, ProductRepository, ProductTransaction};
use shop_domain::{NewProduct, Price, Product, ProductId};

pub fn new_product(name: &str, stock: u32) -> NewProduct {
    NewProduct::new(name, stock, Price::from_units(299)).unwrap()
}

pub async fn memory_repo(names: &[&str]) -> MemoryProductRepository {
    let repo = MemoryProductRepository::new();
    let rows: Vec<_> = names.iter().map(|n| new_product(n, 100)).collect();
    repo.bulk_insert(&rows).await.unwrap();
    repo
}

// =============================================================================
// CACHE DOUBLES
// =============================================================================

/// Cache whose backend is always unreachable
#[derive(Debug, Default)]
pub struct UnavailableCache {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheBackend for UnavailableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::CacheUnavailable("connection refused".into()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::CacheUnavailable("connection refused".into()))
    }
}

// =============================================================================
// STORE DOUBLES
// =============================================================================

/// Memory store that counts every read it serves
#[derive(Debug, Clone, Default)]
pub struct CountingRepository {
    pub inner: MemoryProductRepository,
    reads: Arc<AtomicUsize>,
}

impl CountingRepository {
    pub fn new(inner: MemoryProductRepository) -> Self {
        Self {
            inner,
            reads: Arc::default(),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductRepository for CountingRepository {
    async fn find_one_by_exact_name(&self, name: &str) -> Result<Option<Product>> {
        self.hit();
        self.inner.find_one_by_exact_name(name).await
    }

    async fn find_by_prefix(&self, term: &str) -> Result<Vec<Product>> {
        self.hit();
        self.inner.find_by_prefix(term).await
    }

    async fn find_by_substring(&self, term: &str) -> Result<Vec<Product>> {
        self.hit();
        self.inner.find_by_substring(term).await
    }

    async fn exists_by_substring(&self, term: &str) -> Result<bool> {
        self.hit();
        self.inner.exists_by_substring(term).await
    }

    async fn count(&self) -> Result<u64> {
        self.hit();
        self.inner.count().await
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        self.hit();
        self.inner.list_all().await
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product> {
        self.inner.insert(product).await
    }

    async fn bulk_insert(&self, products: &[NewProduct]) -> Result<u64> {
        self.inner.bulk_insert(products).await
    }

    async fn begin(&self) -> Result<Box<dyn ProductTransaction>> {
        self.inner.begin().await
    }
}

/// Store that is down for every operation
#[derive(Debug, Default)]
pub struct UnreachableRepository;

fn refused<T>() -> Result<T> {
    Err(PersistenceError::Database("connection refused".into()))
}

#[async_trait]
impl ProductRepository for UnreachableRepository {
    async fn find_one_by_exact_name(&self, _name: &str) -> Result<Option<Product>> {
        refused()
    }

    async fn find_by_prefix(&self, _term: &str) -> Result<Vec<Product>> {
        refused()
    }

    async fn find_by_substring(&self, _term: &str) -> Result<Vec<Product>> {
        refused()
    }

    async fn exists_by_substring(&self, _term: &str) -> Result<bool> {
        refused()
    }

    async fn count(&self) -> Result<u64> {
        refused()
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        refused()
    }

    async fn insert(&self, _product: &NewProduct) -> Result<Product> {
        refused()
    }

    async fn bulk_insert(&self, _products: &[NewProduct]) -> Result<u64> {
        refused()
    }

    async fn begin(&self) -> Result<Box<dyn ProductTransaction>> {
        refused()
    }
}

/// Where a [`FaultyRepository`] transaction breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Resolving this id fails.
    Resolve(ProductId),
    /// The delete removes the first half of the rows, then fails.
    DeleteMidway,
    /// Commit fails after the delete succeeded.
    Commit,
}

/// Memory store whose transactions fail at a chosen point
#[derive(Debug, Clone)]
pub struct FaultyRepository {
    pub inner: MemoryProductRepository,
    fault: Fault,
}

impl FaultyRepository {
    pub const fn new(inner: MemoryProductRepository, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

#[async_trait]
impl ProductRepository for FaultyRepository {
    async fn find_one_by_exact_name(&self, name: &str) -> Result<Option<Product>> {
        self.inner.find_one_by_exact_name(name).await
    }

    async fn find_by_prefix(&self, term: &str) -> Result<Vec<Product>> {
        self.inner.find_by_prefix(term).await
    }

    async fn find_by_substring(&self, term: &str) -> Result<Vec<Product>> {
        self.inner.find_by_substring(term).await
    }

    async fn exists_by_substring(&self, term: &str) -> Result<bool> {
        self.inner.exists_by_substring(term).await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        self.inner.list_all().await
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product> {
        self.inner.insert(product).await
    }

    async fn bulk_insert(&self, products: &[NewProduct]) -> Result<u64> {
        self.inner.bulk_insert(products).await
    }

    async fn begin(&self) -> Result<Box<dyn ProductTransaction>> {
        Ok(Box::new(FaultyTransaction {
            inner: self.inner.begin().await?,
            fault: self.fault,
        }))
    }
}

struct FaultyTransaction {
    inner: Box<dyn ProductTransaction>,
    fault: Fault,
}

#[async_trait]
impl ProductTransaction for FaultyTransaction {
    async fn resolve(&mut self, id: ProductId) -> Result<Option<Product>> {
        if self.fault == Fault::Resolve(id) {
            return Err(PersistenceError::Database(format!("lookup of {id} failed")));
        }
        self.inner.resolve(id).await
    }

    async fn delete_many(&mut self, ids: &[ProductId]) -> Result<u64> {
        if self.fault == Fault::DeleteMidway {
            let half = ids.len() / 2;
            self.inner.delete_many(&ids[..half]).await?;
            return Err(PersistenceError::Database("disk I/O error".into()));
        }
        self.inner.delete_many(ids).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fault == Fault::Commit {
            self.inner.rollback().await?;
            return Err(PersistenceError::Database("database is locked".into()));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }
}
