//! In-process product store.
//!
//! Rows live in a `BTreeMap` keyed by id, with a second ordered set of
//! `(name, id)` pairs playing the part of a B-tree name index: prefix
//! queries are range scans over it, substring queries walk every row.
//!
//! A transaction owns the write lock for its whole lifetime, giving
//! serializable isolation. Deletes apply immediately and are recorded in an
//! undo log that is replayed on rollback or on drop.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::traits::{ProductRepository, ProductTransaction};
use crate::error::Result;
use shop_domain::{NewProduct, Product, ProductId};

#[derive(Debug, Default)]
struct Catalog {
    rows: BTreeMap<ProductId, Product>,
    by_name: BTreeSet<(String, ProductId)>,
    last_id: i64,
}

impl Catalog {
    fn insert(&mut self, product: &NewProduct) -> Product {
        self.last_id += 1;
        let product = product.clone().with_id(ProductId::new(self.last_id));
        self.restore(product.clone());
        product
    }

    /// Put back a row that already has an id.
    fn restore(&mut self, product: Product) {
        self.by_name.insert((product.name.clone(), product.id));
        self.rows.insert(product.id, product);
    }

    fn remove(&mut self, id: ProductId) -> Option<Product> {
        let product = self.rows.remove(&id)?;
        self.by_name.remove(&(product.name.clone(), id));
        Some(product)
    }

    /// Ids of names starting with `prefix`, in index order.
    fn prefix_ids<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = ProductId> + 'a {
        let start = (prefix.to_string(), ProductId::new(i64::MIN));
        self.by_name
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(_, id)| *id)
    }
}

/// Product store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProductRepository {
    catalog: Arc<RwLock<Catalog>>,
}

impl MemoryProductRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn find_one_by_exact_name(&self, name: &str) -> Result<Option<Product>> {
        let catalog = self.catalog.read().await;
        let found = catalog
            .prefix_ids(name)
            .filter_map(|id| catalog.rows.get(&id))
            .find(|product| product.name == name)
            .cloned();
        Ok(found)
    }

    async fn find_by_prefix(&self, term: &str) -> Result<Vec<Product>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .prefix_ids(term)
            .filter_map(|id| catalog.rows.get(&id).cloned())
            .collect())
    }

    async fn find_by_substring(&self, term: &str) -> Result<Vec<Product>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .rows
            .values()
            .filter(|product| product.name.contains(term))
            .cloned()
            .collect())
    }

    async fn exists_by_substring(&self, term: &str) -> Result<bool> {
        let catalog = self.catalog.read().await;
        Ok(catalog.rows.values().any(|product| product.name.contains(term)))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.catalog.read().await.rows.len() as u64)
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(self.catalog.read().await.rows.values().cloned().collect())
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product> {
        product.validate()?;
        Ok(self.catalog.write().await.insert(product))
    }

    async fn bulk_insert(&self, products: &[NewProduct]) -> Result<u64> {
        for product in products {
            product.validate()?;
        }
        let mut catalog = self.catalog.write().await;
        for product in products {
            catalog.insert(product);
        }
        Ok(products.len() as u64)
    }

    async fn begin(&self) -> Result<Box<dyn ProductTransaction>> {
        let guard = Arc::clone(&self.catalog).write_owned().await;
        Ok(Box::new(MemoryTransaction {
            catalog: guard,
            undo: Vec::new(),
        }))
    }
}

/// Transaction over [`MemoryProductRepository`]
struct MemoryTransaction {
    catalog: OwnedRwLockWriteGuard<Catalog>,
    undo: Vec<Product>,
}

impl MemoryTransaction {
    fn undo(&mut self) {
        while let Some(product) = self.undo.pop() {
            self.catalog.restore(product);
        }
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.undo.is_empty() {
            tracing::debug!(rows = self.undo.len(), "Uncommitted transaction dropped, rolling back");
        }
        self.undo();
    }
}

#[async_trait]
impl ProductTransaction for MemoryTransaction {
    async fn resolve(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.catalog.rows.get(&id).cloned())
    }

    async fn delete_many(&mut self, ids: &[ProductId]) -> Result<u64> {
        let mut removed = 0;
        for id in ids {
            if let Some(product) = self.catalog.remove(*id) {
                self.undo.push(product);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.undo.clear();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.undo();
        Ok(())
    }
}
