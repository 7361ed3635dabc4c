//! Authentication service.
//!
//! Password registration/login (argon2) and the password-reset token flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use oxcart_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Random bytes in a password-reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Authentication service.
///
/// Handles registration, credential login, and password reset.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`,
    /// `AuthError::PasswordMismatch`, or `AuthError::UserAlreadyExists`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        validate_password(password)?;
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(name, &email, &password_hash, UserRole::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // A malformed email can't match any account
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Start a password reset: mint a random token, store only its SHA-256
    /// hash, and return the plaintext token for the email link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` when no account has this email.
    pub async fn forgot_password(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_reset_token();
        self.users
            .set_reset_token(user.id, &hash_reset_token(&token))
            .await?;

        Ok((user, token))
    }

    /// Complete a password reset with a token from the reset email.
    ///
    /// The token is matched by hash; on success the password is replaced and
    /// the token cleared (single use).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` for an unknown token,
    /// `AuthError::WeakPassword`, or `AuthError::PasswordMismatch`.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError> {
        validate_password(password)?;
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        if token.len() < RESET_TOKEN_BYTES {
            return Err(AuthError::InvalidResetToken);
        }

        let user = self
            .users
            .find_by_reset_token(&hash_reset_token(token))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        self.users
            .update_password(user.id, &hash_password(password)?)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset completed");

        Ok(user)
    }

    /// Change the password of an already signed-in user (no token needed).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch`.
    pub async fn change_password(
        &self,
        user_id: UserId,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(password)?;
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        self.users
            .update_password(user_id, &hash_password(password)?)
            .await?;

        Ok(())
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Mint a random url-safe reset token.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Tokens are stored hashed; a leaked users table can't be replayed.
fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        // 32 bytes base64url without padding
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_reset_token_hash_is_stable_hex() {
        let digest = hash_reset_token("token-a");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_reset_token("token-a"));
        assert_ne!(digest, hash_reset_token("token-b"));
    }
}
