//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::email::EmailService;
use crate::services::payments::{PayPalClient, StripeClient};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email transport error: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections, provider clients, and
/// configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    paypal: PayPalClient,
    stripe: StripeClient,
    email: EmailService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be configured.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let paypal = PayPalClient::new(&config.payment.paypal);
        let stripe = StripeClient::new(&config.payment.stripe);
        let email = EmailService::new(&config.email, &config.base_url)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                paypal,
                stripe,
                email,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the PayPal client.
    #[must_use]
    pub fn paypal(&self) -> &PayPalClient {
        &self.inner.paypal
    }

    /// Get a reference to the Stripe client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }
}
