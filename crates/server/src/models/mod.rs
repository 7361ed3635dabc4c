//! Domain models.
//!
//! Row-backed structs (`sqlx::FromRow`) plus the session-resident types.
//! Shared newtypes (IDs, `Email`, `Money`, statuses) live in `oxcart-core`.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{AdminOrderRow, Order, OrderDetail, OrderItem, OrderSummary, Purchaser, SalesBucket};
pub use product::{CategoryCount, Product, ProductSize};
pub use review::{Review, ReviewWithAuthor};
pub use user::{CurrentUser, GuestUser, User};

/// Keys under which values are stored in the tower-sessions session.
pub mod session_keys {
    /// The signed-in user (`CurrentUser`).
    pub const CURRENT_USER: &str = "current_user";
    /// The anonymous cart token (`uuid::Uuid`), minted on first cart touch.
    pub const CART_TOKEN: &str = "cart_token";
}
