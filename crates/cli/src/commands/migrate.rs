//! Database migration command.
//!
//! Applies the SQL migrations embedded from `crates/server/migrations/`.

use super::CommandError;

/// Run database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
