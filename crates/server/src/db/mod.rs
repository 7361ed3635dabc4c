//! Database operations for the Oxcart `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `users` - Accounts (credentials, role, saved address/payment method)
//! - `guest_users` - Anonymous checkout identities, keyed by email
//! - `carts` - Session-keyed carts with JSONB line items and derived totals
//! - `products` - Catalog (size variants share a `name`)
//! - `orders` / `order_items` - Immutable order snapshots and their lines
//! - `reviews` - Verified-purchase-gated product reviews
//! - `sessions` - Tower-sessions storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p oxcart-cli -- migrate
//! ```
//!
//! Queries use the runtime-checked sqlx API with `FromRow` models; all
//! multi-statement writes (order placement, mark-paid, review upserts) run
//! inside a single transaction.

pub mod carts;
pub mod guests;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use guests::GuestRepository;
pub use orders::OrderRepository;
pub use products::{ProductFilter, ProductInput, ProductRepository, ProductSort};
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, paid-once guard).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
