//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! the client always sees a `{"success": false, "message": ...}` JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{
    AuthError, CartError, CheckoutError, EmailError, FulfillmentError, PaymentError,
};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Fulfillment transition failed.
    #[error("Fulfillment error: {0}")]
    Fulfillment(#[from] FulfillmentError),

    /// Payment provider operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Email could not be sent.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The `{success, message}` body every error response carries.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => true,
            Self::Auth(AuthError::Repository(_) | AuthError::Hash(_))
            | Self::Cart(CartError::Repository(_))
            | Self::Checkout(CheckoutError::Repository(_))
            | Self::Fulfillment(FulfillmentError::Repository(_)) => true,
            Self::Payment(err) => matches!(
                err,
                PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_)
            ),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                AuthError::Hash(_) | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound => StatusCode::NOT_FOUND,
                CartError::OutOfStock { .. } | CartError::ItemNotInCart => StatusCode::BAD_REQUEST,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CheckoutError::IdentityNotFound => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Fulfillment(err) => match err {
                FulfillmentError::NotFound => StatusCode::NOT_FOUND,
                FulfillmentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Payment(err) => match err {
                PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                PaymentError::Verification(_)
                | PaymentError::Signature(_)
                | PaymentError::InvalidAmount => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-visible message. Internal failure details stay server-side.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => {
                "Internal server error".to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::Hash(_) | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Cart(err) => match err {
                CartError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Fulfillment(err) => match err {
                FulfillmentError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Payment(err) => match err {
                PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
                    "Payment provider error".to_string()
                }
                other => other.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            message: self.public_message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("sign in".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("admins only".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_fulfillment_error_mapping() {
        assert_eq!(
            status_of(AppError::Fulfillment(FulfillmentError::AlreadyPaid)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Fulfillment(FulfillmentError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.public_message(), "Internal server error");
    }
}
