//! Product review models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use oxcart_core::{ProductId, ReviewId, UserId};

/// A user's rating and comment for a product, one per (user, product).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: i32,
    pub title: String,
    pub description: String,
    /// Set when the author had a delivered order containing the product.
    pub is_verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review joined with its author's display name, as listed on the product
/// page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    pub id: ReviewId,
    pub rating: i32,
    pub title: String,
    pub description: String,
    pub is_verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
}
