//! SQLite repository implementation.
//!
//! The `products` table carries a B-tree index on `name`. Prefix search is
//! phrased as a half-open range on `name` so the planner can walk that
//! index; substring search uses `instr`, which no B-tree can serve, and
//! degrades to a table scan.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite, Transaction};
use std::str::FromStr;

use super::traits::{ProductRepository, ProductTransaction};
use crate::error::{PersistenceError, Result};
use shop_domain::{NewProduct, Price, Product, ProductId};

/// Rows per multi-row statement, three bound parameters each.
const INSERT_CHUNK: usize = 300;
const DELETE_CHUNK: usize = 500;

const SELECT_COLUMNS: &str = "SELECT id, name, stock, price_cents FROM products";

// =============================================================================
// SQLITE CONFIGURATION
// =============================================================================

/// SQLite connection configuration.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }
}

impl SqliteConfig {
    /// Every connection to an in-memory database opens a fresh, empty one.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

// =============================================================================
// ROW MAPPING
// =============================================================================

/// Database row representation of a product.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    stock: i64,
    price_cents: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = PersistenceError;

    fn try_from(row: ProductRow) -> std::result::Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|_| {
            PersistenceError::Database(format!("Invalid stock {} for product {}", row.stock, row.id))
        })?;
        let cents = u64::try_from(row.price_cents).map_err(|_| {
            PersistenceError::Database(format!(
                "Invalid price {} for product {}",
                row.price_cents, row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            stock,
            price: Price::from_cents(cents),
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

fn price_param(price: Price) -> Result<i64> {
    i64::try_from(price.cents())
        .map_err(|_| PersistenceError::InvalidRequest(format!("Price {price} out of range")))
}

/// Smallest string greater than every string starting with `prefix`, or
/// `None` when no such bound exists.
fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        let next = (u32::from(last) + 1..=u32::from(char::MAX)).find_map(char::from_u32);
        if let Some(next) = next {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

// =============================================================================
// SQLITE REPOSITORY
// =============================================================================

/// Product repository backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    /// Connect and make sure the schema exists.
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // One connection that never closes keeps the database alive.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        tracing::info!(url = %config.url, "SQLite connection pool established");

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the products table and its name index.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS products (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT    NOT NULL,
                stock       INTEGER NOT NULL CHECK (stock >= 0),
                price_cents INTEGER NOT NULL CHECK (price_cents >= 0)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn find_one_by_exact_name(&self, name: &str) -> Result<Option<Product>> {
        tracing::debug!(name, "Finding product by exact name");

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_COLUMNS} WHERE name = ? ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn find_by_prefix(&self, term: &str) -> Result<Vec<Product>> {
        let rows = match prefix_upper_bound(term) {
            Some(upper) => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "{SELECT_COLUMNS} WHERE name >= ? AND name < ? ORDER BY name, id"
                ))
                .bind(term)
                .bind(upper)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "{SELECT_COLUMNS} WHERE name >= ? ORDER BY name, id"
                ))
                .bind(term)
                .fetch_all(&self.pool)
                .await?
            }
        };

        into_products(rows)
    }

    async fn find_by_substring(&self, term: &str) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_COLUMNS} WHERE instr(name, ?) > 0 ORDER BY id"
        ))
        .bind(term)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn exists_by_substring(&self, term: &str) -> Result<bool> {
        let found: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM products WHERE instr(name, ?) > 0 LIMIT 1")
                .bind(term)
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        into_products(rows)
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product> {
        product.validate()?;

        let result =
            sqlx::query("INSERT INTO products (name, stock, price_cents) VALUES (?, ?, ?)")
                .bind(&product.name)
                .bind(i64::from(product.stock))
                .bind(price_param(product.price)?)
                .execute(&self.pool)
                .await?;

        Ok(product
            .clone()
            .with_id(ProductId::new(result.last_insert_rowid())))
    }

    async fn bulk_insert(&self, products: &[NewProduct]) -> Result<u64> {
        let mut rows = Vec::with_capacity(products.len());
        for product in products {
            product.validate()?;
            rows.push((
                product.name.clone(),
                i64::from(product.stock),
                price_param(product.price)?,
            ));
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO products (name, stock, price_cents) ");
            builder.push_values(chunk, |mut b, (name, stock, price)| {
                b.push_bind(name.clone())
                    .push_bind(*stock)
                    .push_bind(*price);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        tracing::debug!(rows = written, "Bulk insert committed");
        Ok(written)
    }

    async fn begin(&self) -> Result<Box<dyn ProductTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}

/// Transaction over [`SqliteProductRepository`]. sqlx rolls back on drop.
struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ProductTransaction for SqliteTransaction {
    async fn resolve(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Product::try_from).transpose()
    }

    async fn delete_many(&mut self, ids: &[ProductId]) -> Result<u64> {
        let mut removed = 0;
        for chunk in ids.chunks(DELETE_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("DELETE FROM products WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.get());
            }
            separated.push_unseparated(")");
            removed += builder.build().execute(&mut *self.tx).await?.rows_affected();
        }
        Ok(removed)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let Self { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
