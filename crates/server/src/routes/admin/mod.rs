//! Admin back-office routes, all behind the admin role.
//!
//! ```text
//! GET    /admin/orders                  - Order list (filter by purchaser name)
//! GET    /admin/orders/summary          - Dashboard aggregate
//! POST   /admin/orders/purge-unpaid     - Delete unpaid orders older than 24h
//! DELETE /admin/orders/{id}             - Delete an order
//! POST   /admin/orders/{id}/mark-paid   - Mark paid (cash on delivery)
//! POST   /admin/orders/{id}/deliver     - Mark delivered
//! PUT    /admin/orders/{id}/tracking    - Set the tracking number
//! DELETE /admin/orders/{id}/tracking    - Remove it (Shipped -> Paid)
//!
//! GET    /admin/products                - Full product list (variants included)
//! POST   /admin/products                - Create product
//! PUT    /admin/products/{id}           - Update product
//! DELETE /admin/products/{id}           - Delete product
//!
//! GET    /admin/users                   - User list (name/email filter)
//! PUT    /admin/users/{id}              - Edit name and role
//! DELETE /admin/users/{id}              - Delete user
//! ```

pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Orders
        .route("/orders", get(orders::list))
        .route("/orders/summary", get(orders::summary))
        .route("/orders/purge-unpaid", post(orders::purge_unpaid))
        .route("/orders/{id}", delete(orders::remove))
        .route("/orders/{id}/mark-paid", post(orders::mark_paid))
        .route("/orders/{id}/deliver", post(orders::deliver))
        .route(
            "/orders/{id}/tracking",
            put(orders::set_tracking).delete(orders::remove_tracking),
        )
        // Products
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            put(products::update).delete(products::remove),
        )
        // Users
        .route("/users", get(users::list))
        .route("/users/{id}", put(users::update).delete(users::remove))
}
