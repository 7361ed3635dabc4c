//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! carries the signed-in user and the anonymous cart token.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "oxcart_session";

/// Session expiry time in seconds (30 days, matching the shop's sign-in
/// lifetime).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The caller is responsible for running the store's migration
/// (`PostgresStore::migrate`) before serving traffic.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - Server configuration (to decide cookie security)
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ServerConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The session's cart token, if a cart was ever touched.
pub async fn cart_token(session: &Session) -> Option<Uuid> {
    session
        .get::<Uuid>(session_keys::CART_TOKEN)
        .await
        .ok()
        .flatten()
}

/// The session's cart token, minting one on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn ensure_cart_token(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(token) = cart_token(session).await {
        return Ok(token);
    }

    let token = Uuid::new_v4();
    session.insert(session_keys::CART_TOKEN, token).await?;
    Ok(token)
}
