//! Product catalog types.
//!
//! The catalog itself (create/update/delete, images, categories) is owned
//! elsewhere; the engine only reads products and adjusts their stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::{Price, ProductId};

/// A catalog product as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Unique stock-keeping unit.
    pub sku: String,
    /// Current unit price.
    pub price: Price,
    /// Units on hand. Never negative.
    pub stock: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a product (seeding and tests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Unique stock-keeping unit.
    pub sku: String,
    /// Unit price.
    pub price: Price,
    /// Initial stock level.
    pub stock: i32,
}

/// The slice of a product embedded in cart and order views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub price: Price,
    /// Stock-keeping unit.
    pub sku: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            sku: product.sku.clone(),
        }
    }
}
