//! Product review repository.

use sqlx::PgPool;

use oxcart_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewWithAuthor};

const REVIEW_COLUMNS: &str = "id, user_id, product_id, rating, title, description, \
     is_verified_purchase, created_at, updated_at";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create or replace the user's review of a product, and recompute the
    /// product's rating aggregate in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        title: &str,
        description: &str,
        is_verified_purchase: bool,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews
                 (user_id, product_id, rating, title, description, is_verified_purchase)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id, product_id) DO UPDATE
                 SET rating = EXCLUDED.rating,
                     title = EXCLUDED.title,
                     description = EXCLUDED.description,
                     is_verified_purchase = EXCLUDED.is_verified_purchase,
                     updated_at = now()
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(title)
        .bind(description)
        .bind(is_verified_purchase)
        .fetch_one(&mut *tx)
        .await?;

        // Keep the product aggregate in step with its reviews
        sqlx::query(
            "UPDATE products
             SET rating = COALESCE(
                     (SELECT avg(rating)::numeric(3,2) FROM reviews WHERE product_id = $1), 0),
                 num_reviews = (SELECT count(*) FROM reviews WHERE product_id = $1)
             WHERE id = $1",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(review)
    }

    /// Reviews for a product, newest first, with author names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            "SELECT r.id, r.rating, r.title, r.description, r.is_verified_purchase,
                    r.created_at, u.name AS author_name
             FROM reviews r
             JOIN users u ON r.user_id = u.id
             WHERE r.product_id = $1
             ORDER BY r.created_at DESC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// The user's own review of a product, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND product_id = $2"
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(review)
    }

    /// Whether the user has a delivered order containing the product
    /// (the verified-purchase gate).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_purchased(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let purchased: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM orders o
                 JOIN order_items oi ON oi.order_id = o.id
                 WHERE o.user_id = $1 AND oi.product_id = $2 AND o.is_delivered
             )",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(purchased)
    }
}
