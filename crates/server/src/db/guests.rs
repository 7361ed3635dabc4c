//! Guest checkout identity repository.

use sqlx::PgPool;

use oxcart_core::{Email, GuestId, PaymentMethod, ShippingAddress};

use super::RepositoryError;
use crate::models::GuestUser;

const GUEST_COLUMNS: &str = "id, email, name, address, payment_method, created_at";

/// Repository for guest checkout identities.
pub struct GuestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GuestRepository<'a> {
    /// Create a new guest repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a guest by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: GuestId) -> Result<Option<GuestUser>, RepositoryError> {
        let guest = sqlx::query_as::<_, GuestUser>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guest_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(guest)
    }

    /// Create a guest for this email, or refresh the name/address of an
    /// existing one. The email is the guest's stable identity across visits.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_with_address(
        &self,
        email: &Email,
        name: &str,
        address: &ShippingAddress,
    ) -> Result<GuestUser, RepositoryError> {
        let guest = sqlx::query_as::<_, GuestUser>(&format!(
            "INSERT INTO guest_users (email, name, address)
             VALUES ($1, $2, $3)
             ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, address = EXCLUDED.address
             RETURNING {GUEST_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(address)
        .fetch_one(self.pool)
        .await?;

        Ok(guest)
    }

    /// Save the guest's payment method choice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the guest doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_payment_method(
        &self,
        id: GuestId,
        method: PaymentMethod,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE guest_users SET payment_method = $1 WHERE id = $2")
            .bind(method)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
