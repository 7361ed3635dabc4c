//! Admin user bootstrap command.

use oxcart_core::{Email, UserRole};
use oxcart_server::db::UserRepository;
use oxcart_server::services::auth::hash_password;

/// Create an admin user.
///
/// # Errors
///
/// Returns an error for an invalid email, a duplicate account, or a database
/// failure.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let pool = super::connect().await?;

    let password_hash = hash_password(password)?;

    let user = UserRepository::new(&pool)
        .create_with_password(name, &email, &password_hash, UserRole::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin user created");
    Ok(())
}
