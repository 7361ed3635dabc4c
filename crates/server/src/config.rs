//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `BASE_URL` - Public URL for the storefront (used in email links)
//! - `SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `PAYPAL_CLIENT_ID` / `PAYPAL_CLIENT_SECRET` - PayPal REST credentials
//! - `STRIPE_SECRET_KEY` / `STRIPE_WEBHOOK_SECRET` - Stripe API credentials
//! - `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` - Transactional email
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `PAYMENT_METHODS` - Comma-separated methods offered at checkout
//!   (default: `paypal,stripe,cash_on_delivery`; the first entry is the
//!   default method)
//! - `PAYPAL_API_BASE` - PayPal API host (default: sandbox)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `EMAIL_FROM` - From address (default: `Oxcart <no-reply@oxcart.store>`)
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use oxcart_core::PaymentMethod;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Checkout payment configuration
    pub payment: PaymentConfig,
    /// Transactional email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Payment provider configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Methods offered at checkout, in display order. The first entry is the
    /// default applied when a user never picked one.
    pub methods: Vec<PaymentMethod>,
    pub paypal: PayPalConfig,
    pub stripe: StripeConfig,
}

impl PaymentConfig {
    /// The method applied when the user never chose one.
    ///
    /// The methods list is validated non-empty at load time.
    #[must_use]
    pub fn default_method(&self) -> PaymentMethod {
        self.methods.first().copied().unwrap_or(PaymentMethod::PayPal)
    }
}

/// PayPal REST API configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// API host, e.g. `https://api-m.sandbox.paypal.com`
    pub api_base: String,
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: SecretString,
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// SMTP configuration for transactional email.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let base_url = get_required_env("BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BASE_URL".to_string(), e.to_string()))?;

        let session_secret = get_validated_secret("SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SESSION_SECRET")?;

        let payment = PaymentConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            payment,
            email,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_env_or_default("PAYMENT_METHODS", "paypal,stripe,cash_on_delivery");
        let methods = parse_payment_methods(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("PAYMENT_METHODS".to_string(), e))?;

        Ok(Self {
            methods,
            paypal: PayPalConfig {
                client_id: get_required_env("PAYPAL_CLIENT_ID")?,
                client_secret: get_validated_secret("PAYPAL_CLIENT_SECRET")?,
                api_base: get_env_or_default(
                    "PAYPAL_API_BASE",
                    "https://api-m.sandbox.paypal.com",
                ),
            },
            stripe: StripeConfig {
                secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
                webhook_secret: get_validated_secret("STRIPE_WEBHOOK_SECRET")?,
            },
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: get_env_or_default("SMTP_PORT", "587")
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_env_or_default("EMAIL_FROM", "Oxcart <no-reply@oxcart.store>"),
        })
    }
}

/// Parse the `PAYMENT_METHODS` list, rejecting unknown or duplicate entries.
fn parse_payment_methods(raw: &str) -> Result<Vec<PaymentMethod>, String> {
    let mut methods = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let method: PaymentMethod = part.parse()?;
        if methods.contains(&method) {
            return Err(format!("duplicate payment method: {method}"));
        }
        methods.push(method);
    }
    if methods.is_empty() {
        return Err("at least one payment method is required".to_string());
    }
    Ok(methods)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_parse_payment_methods_default_set() {
        let methods = parse_payment_methods("paypal,stripe,cash_on_delivery").unwrap();
        assert_eq!(
            methods,
            vec![
                PaymentMethod::PayPal,
                PaymentMethod::Stripe,
                PaymentMethod::CashOnDelivery
            ]
        );
    }

    #[test]
    fn test_parse_payment_methods_single() {
        let methods = parse_payment_methods("cash_on_delivery").unwrap();
        assert_eq!(methods, vec![PaymentMethod::CashOnDelivery]);
    }

    #[test]
    fn test_parse_payment_methods_rejects_unknown() {
        assert!(parse_payment_methods("paypal,bitcoin").is_err());
    }

    #[test]
    fn test_parse_payment_methods_rejects_duplicates() {
        assert!(parse_payment_methods("paypal,paypal").is_err());
    }

    #[test]
    fn test_parse_payment_methods_rejects_empty() {
        assert!(parse_payment_methods("").is_err());
    }

    #[test]
    fn test_default_method_is_first() {
        let config = PaymentConfig {
            methods: vec![PaymentMethod::Stripe, PaymentMethod::PayPal],
            paypal: PayPalConfig {
                client_id: "client".to_string(),
                client_secret: SecretString::from("s"),
                api_base: "https://api-m.sandbox.paypal.com".to_string(),
            },
            stripe: StripeConfig {
                secret_key: SecretString::from("k"),
                webhook_secret: SecretString::from("w"),
            },
        };
        assert_eq!(config.default_method(), PaymentMethod::Stripe);
    }
}
