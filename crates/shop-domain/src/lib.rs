//! # Storefront - Domain Model
//!
//! Core entities and value objects for the storefront catalog. These types
//! are shared by the persistence layer, the cache layer, and any request
//! layer sitting on top of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Surrogate product identity, assigned monotonically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Store-assigned ids start at 1; anything else can never resolve.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for ProductId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidProductId(s.to_string()))?;
        let id = Self(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(DomainError::InvalidProductId(s.to_string()))
        }
    }
}

/// Non-negative fixed-point price in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Whole currency units, e.g. `Price::from_units(299)` is `299.00`.
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units * 100)
    }

    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Product entity - one catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
    pub price: Price,
}

/// Insert payload for a product that has no identity yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub stock: u32,
    pub price: Price,
}

impl NewProduct {
    /// Build a validated insert payload.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidName`] if the name is blank.
    pub fn new(name: impl Into<String>, stock: u32, price: Price) -> Result<Self, DomainError> {
        let product = Self {
            name: name.into(),
            stock,
            price,
        };
        product.validate()?;
        Ok(product)
    }

    /// Check invariants on a payload that may have been built field by field.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidName`] if the name is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidName(self.name.clone()));
        }
        Ok(())
    }

    /// Attach a store-assigned identity.
    #[must_use]
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            stock: self.stock,
            price: self.price,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid product id: '{0}'")]
    InvalidProductId(String),

    #[error("Invalid product name: '{0}'")]
    InvalidName(String),
}
