//! HTTP route handlers.
//!
//! All handlers speak JSON. Mutating actions answer with an
//! [`ActionResponse`] (`{success, message, redirect_to?, data?}`); reads
//! return the domain models directly. Errors funnel through
//! [`crate::error::AppError`] into the same `{success: false, message}`
//! shape.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /products                    - Search/browse (query, category, price, rating, sort, page)
//! GET  /products/latest             - Latest products (one per name)
//! GET  /products/featured           - Featured products
//! GET  /product/{slug}              - Product detail + size variants
//! GET  /categories                  - Categories with product counts
//!
//! # Cart
//! GET  /cart                        - Current cart (empty view before first touch)
//! POST /cart/add                    - Add an item
//! POST /cart/remove                 - Remove one unit of an item
//!
//! # Checkout
//! GET  /checkout-info               - Prefill data for the checkout steps
//! POST /shipping-address            - Save address (user or guest)
//! POST /payment-method              - Save payment method (user or guest)
//! POST /place-order                 - Create the order from the cart
//!
//! # Orders & payment
//! GET  /orders                      - My paid orders (signed-in)
//! GET  /orders/{id}                 - Order detail
//! POST /orders/find                 - Guest order lookup (id + email)
//! POST /orders/{id}/paypal/create   - Create PayPal provider order
//! POST /orders/{id}/paypal/capture  - Capture + verify + mark paid
//! POST /orders/{id}/stripe/intent   - Create Stripe payment intent
//! POST /webhooks/stripe             - Signed Stripe reconciliation webhook
//!
//! # Auth & account
//! POST /auth/register               - Sign up (rate limited)
//! POST /auth/login                  - Sign in (rate limited, claims session cart)
//! POST /auth/logout                 - Sign out (drops session cart)
//! POST /auth/forgot-password        - Send reset link (rate limited)
//! POST /auth/reset-password         - Reset via token, or change when signed in
//! GET  /account                     - Profile
//! PUT  /account/profile             - Update display name
//!
//! # Reviews
//! GET  /products/{id}/reviews       - Reviews for a product
//! GET  /products/{id}/reviews/mine  - My review + purchase eligibility
//! POST /products/{id}/reviews       - Create or update my review
//!
//! # Admin (role-gated)
//! /admin/orders, /admin/products, /admin/users - see `admin`
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::middleware::auth_rate_limiter;
use crate::services::checkout::MissingStep;
use crate::state::AppState;

/// Default page size for paginated listings.
pub const PAGE_SIZE: i64 = 10;

/// The `{success, message, ...}` envelope for mutating actions.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionResponse {
    /// A plain success.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            redirect_to: None,
            data: None,
        }
    }

    /// A success that sends the client somewhere.
    #[must_use]
    pub fn ok_redirect(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        Self {
            redirect_to: Some(redirect_to.into()),
            ..Self::ok(message)
        }
    }

    /// A success carrying a data payload.
    #[must_use]
    pub fn ok_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }

    /// A soft failure pointing the client at the missing checkout step.
    #[must_use]
    pub fn missing_step(step: MissingStep) -> Self {
        Self {
            success: false,
            message: step.message().to_owned(),
            redirect_to: Some(step.redirect_to().to_owned()),
            data: None,
        }
    }
}

/// A page of results with the total page count.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    /// Wrap a page of rows given the unpaged row count.
    #[must_use]
    pub fn new(data: Vec<T>, total_count: i64, page_size: i64) -> Self {
        Self {
            data,
            total_pages: total_pages(total_count, page_size),
        }
    }
}

/// Ceiling division for page counts.
const fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count <= 0 {
        return 0;
    }
    (total_count + page_size - 1) / page_size
}

/// Common pagination/search query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub query: Option<String>,
}

impl PageQuery {
    /// The 1-based page, clamped to at least 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// The row offset for [`PAGE_SIZE`]-sized pages.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * PAGE_SIZE
    }

    /// The search fragment, with `all`/empty meaning "no filter".
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty() && *q != "all")
    }
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    let rate_limited_auth = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .layer(auth_rate_limiter());

    let auth_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/reset-password", post(auth::reset_password))
        .merge(rate_limited_auth);

    let cart_routes = Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove));

    let order_routes = Router::new()
        .route("/", get(orders::my_orders))
        .route("/find", post(orders::find))
        .route("/{id}", get(orders::show))
        .route("/{id}/paypal/create", post(orders::paypal_create))
        .route("/{id}/paypal/capture", post(orders::paypal_capture))
        .route("/{id}/stripe/intent", post(orders::stripe_intent));

    Router::new()
        // Catalog
        .route("/products", get(catalog::index))
        .route("/products/latest", get(catalog::latest))
        .route("/products/featured", get(catalog::featured))
        .route("/product/{slug}", get(catalog::show))
        .route("/categories", get(catalog::categories))
        // Reviews
        .route(
            "/products/{id}/reviews",
            get(reviews::list).post(reviews::upsert),
        )
        .route("/products/{id}/reviews/mine", get(reviews::mine))
        // Cart
        .nest("/cart", cart_routes)
        // Checkout
        .route("/checkout-info", get(checkout::info))
        .route("/shipping-address", post(checkout::save_shipping_address))
        .route("/payment-method", post(checkout::save_payment_method))
        .route("/place-order", post(checkout::place_order))
        // Orders & payment
        .nest("/orders", order_routes)
        .route("/webhooks/stripe", post(orders::stripe_webhook))
        // Auth & account
        .nest("/auth", auth_routes)
        .route("/account", get(account::show))
        .route("/account/profile", axum::routing::put(account::update_profile))
        // Admin back-office
        .nest("/admin", admin::routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_page_query_clamps_and_filters() {
        let q = PageQuery {
            page: Some(0),
            query: Some("all".to_owned()),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.filter(), None);

        let q = PageQuery {
            page: Some(3),
            query: Some(" shirt ".to_owned()),
        };
        assert_eq!(q.offset(), 2 * PAGE_SIZE);
        assert_eq!(q.filter(), Some("shirt"));
    }
}
