//! Catalog seeding.
//!
//! Both operations are idempotent: they check for an existing marker row
//! first and report [`SeedOutcome::AlreadyExists`] instead of inserting twice.

use rand::Rng;

use crate::error::Result;
use crate::repository::SharedRepository;
use crate::stock::{DEFAULT_STOCK_PRODUCT, STOCK_SEED_LEVEL};
use shop_domain::{NewProduct, Price};

/// Character lines the demo catalog is generated from.
pub const CHARACTERS: [&str; 8] = [
    "Guava Dog",
    "Pineapple Dog",
    "Kiwi Dog",
    "Banana Dog",
    "Apple Dog",
    "Welfare Bear",
    "Little Fu",
    "Mr. PX",
];

/// Rows generated per character by default (100 000 in total).
pub const DEFAULT_PER_CHARACTER: u32 = 12_500;

const STOCK_PRODUCT_PRICE: Price = Price::from_units(299);

/// Result of a seeding call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Rows inserted
    Created(u64),
    /// Marker row found, nothing inserted
    AlreadyExists,
}

impl SeedOutcome {
    #[must_use]
    pub const fn created(self) -> u64 {
        match self {
            Self::Created(n) => n,
            Self::AlreadyExists => 0,
        }
    }
}

/// Generate the demo catalog rows.
///
/// Names are `"{character} Plush #{i}"` for `i` in `1..=per_character`;
/// stock is drawn from `50..500` and price from `199..999` whole units.
///
/// # Errors
///
/// Only if a generated row fails domain validation.
pub fn catalog_rows<R: Rng + ?Sized>(per_character: u32, rng: &mut R) -> Result<Vec<NewProduct>> {
    let mut rows = Vec::with_capacity(CHARACTERS.len() * per_character as usize);
    for character in CHARACTERS {
        for i in 1..=per_character {
            rows.push(NewProduct::new(
                format!("{character} Plush #{i}"),
                rng.gen_range(50..500),
                Price::from_units(rng.gen_range(199..999)),
            )?);
        }
    }
    Ok(rows)
}

/// Inserts demo data into a store
#[derive(Clone)]
pub struct CatalogSeeder {
    repo: SharedRepository,
    stock_product: String,
}

impl CatalogSeeder {
    pub fn new(repo: SharedRepository) -> Self {
        Self::for_product(repo, DEFAULT_STOCK_PRODUCT)
    }

    /// Seeder whose stock product has a custom name.
    pub fn for_product(repo: SharedRepository, stock_product: impl Into<String>) -> Self {
        Self {
            repo,
            stock_product: stock_product.into(),
        }
    }

    /// Insert the stock product unless a row with its exact name exists.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn init_stock_product(&self) -> Result<SeedOutcome> {
        if self
            .repo
            .find_one_by_exact_name(&self.stock_product)
            .await?
            .is_some()
        {
            tracing::debug!(product = %self.stock_product, "Stock product already present");
            return Ok(SeedOutcome::AlreadyExists);
        }

        let product = self
            .repo
            .insert(&NewProduct::new(
                self.stock_product.as_str(),
                STOCK_SEED_LEVEL,
                STOCK_PRODUCT_PRICE,
            )?)
            .await?;

        tracing::info!(id = %product.id, product = %product.name, stock = product.stock, "Seeded stock product");
        Ok(SeedOutcome::Created(1))
    }

    /// Bulk-insert the demo catalog unless it was seeded before.
    ///
    /// The marker is any product whose name contains the first character.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn seed_catalog(&self, per_character: u32) -> Result<SeedOutcome> {
        if self.repo.exists_by_substring(CHARACTERS[0]).await? {
            tracing::debug!(marker = CHARACTERS[0], "Catalog already seeded");
            return Ok(SeedOutcome::AlreadyExists);
        }

        // Generated before any await; the thread RNG is not Send.
        let rows = catalog_rows(per_character, &mut rand::thread_rng())?;
        let inserted = self.repo.bulk_insert(&rows).await?;

        tracing::info!(rows = inserted, per_character, "Seeded catalog");
        Ok(SeedOutcome::Created(inserted))
    }
}
