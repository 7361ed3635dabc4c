//! Cart repository.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use oxcart_core::{CartId, GuestId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem};
use crate::services::cart::CartTotals;

const CART_COLUMNS: &str = "id, user_id, guest_id, session_token, items, \
     items_price, shipping_price, tax_price, total_price, created_at, updated_at";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the cart for a session token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_token(&self, token: Uuid) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE session_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(cart)
    }

    /// Create an empty cart for a session token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        token: Uuid,
        user_id: Option<UserId>,
    ) -> Result<Cart, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(&format!(
            "INSERT INTO carts (session_token, user_id)
             VALUES ($1, $2)
             RETURNING {CART_COLUMNS}"
        ))
        .bind(token)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(cart)
    }

    /// Replace the cart's items and derived totals in one write.
    ///
    /// The totals come from [`CartTotals::compute`]; this is the only path
    /// that touches the price columns, keeping them consistent with `items`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save_items(
        &self,
        id: CartId,
        items: &[CartItem],
        totals: &CartTotals,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE carts
             SET items = $1, items_price = $2, shipping_price = $3,
                 tax_price = $4, total_price = $5, updated_at = now()
             WHERE id = $6",
        )
        .bind(Json(items))
        .bind(totals.items_price)
        .bind(totals.shipping_price)
        .bind(totals.tax_price)
        .bind(totals.total_price)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Link a cart to a guest identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn link_guest(&self, id: CartId, guest_id: GuestId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE carts SET guest_id = $1, updated_at = now() WHERE id = $2")
                .bind(guest_id)
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Claim the session cart for a user signing in.
    ///
    /// The session cart wins: any older carts of this user are dropped and
    /// the session cart becomes theirs (its guest link, if any, is cleared).
    /// A user signing in without a session cart keeps whatever they had.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn claim_for_user(
        &self,
        token: Uuid,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let session_cart_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM carts WHERE session_token = $1)",
        )
        .bind(token)
        .fetch_one(&mut *tx)
        .await?;

        if session_cart_exists {
            sqlx::query("DELETE FROM carts WHERE user_id = $1 AND session_token <> $2")
                .bind(user_id)
                .bind(token)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "UPDATE carts
                 SET user_id = $1, guest_id = NULL, updated_at = now()
                 WHERE session_token = $2",
            )
            .bind(user_id)
            .bind(token)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Delete the cart for a session token (sign-out).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_token(&self, token: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE session_token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
