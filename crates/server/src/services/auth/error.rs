//! Authentication error types.

use thiserror::Error;

use oxcart_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password combination is wrong (deliberately uniform).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No account matches the given email.
    #[error("user not found")]
    UserNotFound,

    /// Password doesn't meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords don't match")]
    PasswordMismatch,

    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Reset token is unknown or already consumed.
    #[error("invalid or expired token")]
    InvalidResetToken,

    /// Password hashing/verification failed internally.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
