//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use protech_core::ProductId;

/// A catalog product.
///
/// The `stock` field is the contended resource of the whole system: it is
/// only ever mutated through the repository's atomic conditional updates.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Brand label.
    pub brand: String,
    /// Category label.
    pub category: String,
    /// Long-form description.
    pub description: String,
    /// Unit price. Non-negative.
    pub price: Decimal,
    /// Units in stock. Non-negative at all times.
    pub stock: i32,
    /// Image URLs, opaque to the backend.
    pub images: Vec<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Catalog management input for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    /// Display name.
    pub name: String,
    /// Brand label.
    #[serde(default)]
    pub brand: String,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Decimal,
    /// Units in stock.
    #[serde(default)]
    pub stock: i32,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
}
