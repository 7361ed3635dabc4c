//! Middleware: sessions, auth extractors, rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod session;

pub use auth::{OptionalUser, RequireAdmin, RequireUser, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use session::{cart_token, create_session_layer, ensure_cart_token};
