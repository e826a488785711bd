//! # Product Catalog
//!
//! Read-only product reference data. The engine never mutates or persists
//! products; edits live in the [`ChangeLedger`](crate::ledger::ChangeLedger).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CartelError;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    /// Product photo (URL or path).
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: String::new(),
            price,
            category: String::new(),
            brand: String::new(),
            description: String::new(),
            image: None,
        }
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Source of product records.
pub trait ProductCatalog: Send + Sync {
    fn product(&self, id: &str) -> Option<Product>;

    fn products(&self) -> Vec<Product>;

    /// Look up every id, failing on the first one that is missing.
    fn select(&self, ids: &[String]) -> Result<Vec<Product>, CartelError> {
        ids.iter()
            .map(|id| {
                self.product(id)
                    .ok_or_else(|| CartelError::Catalog(format!("Unknown product '{}'", id)))
            })
            .collect()
    }
}

/// Catalog held in memory, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: BTreeMap<String, Product>,
}

impl InMemoryCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Parse a JSON array of products.
    pub fn from_json(json: &str) -> Result<Self, CartelError> {
        let products: Vec<Product> = serde_json::from_str(json)
            .map_err(|e| CartelError::Catalog(format!("Malformed catalog: {}", e)))?;
        Ok(Self::new(products))
    }

    pub fn load(path: &Path) -> Result<Self, CartelError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CartelError::Catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn product(&self, id: &str) -> Option<Product> {
        self.products.get(id).cloned()
    }

    fn products(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }
}
