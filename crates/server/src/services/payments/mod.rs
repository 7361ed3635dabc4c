//! Payment provider adapters.
//!
//! Thin REST clients over `reqwest` that normalize provider responses into
//! the internal [`oxcart_core::PaymentReceipt`] record.

pub mod paypal;
pub mod stripe;

pub use paypal::PayPalClient;
pub use stripe::StripeClient;

use thiserror::Error;

/// Errors that can occur when interacting with a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a provider response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Captured payment didn't match what we were expecting.
    #[error("payment verification failed: {0}")]
    Verification(String),

    /// Webhook signature check failed.
    #[error("invalid webhook signature: {0}")]
    Signature(String),

    /// Order total can't be represented for the provider.
    #[error("invalid payment amount")]
    InvalidAmount,
}
