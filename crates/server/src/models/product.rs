//! Product catalog models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use oxcart_core::{Money, ProductId};

/// A catalog entry.
///
/// Products sharing a `name` represent size variants of the same garment;
/// each variant has its own slug, stock, and price.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub images: Vec<String>,
    pub price: Money,
    pub stock: i32,
    /// Average review rating, recomputed whenever a review lands.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub banner: Option<String>,
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Size variant projection for a product family.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSize {
    pub size: Option<String>,
    pub slug: String,
}

/// A category with its product count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}
