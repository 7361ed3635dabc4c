//! Cart models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use oxcart_core::{CartId, GuestId, Money, ProductId, UserId};

/// One line in a cart, denormalized from the product at add time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub price: Money,
    pub qty: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// A pending, mutable line-item collection prior to order placement.
///
/// Keyed by a session token; owned by at most one of {user, guest}. The four
/// price columns are derived - always recomputed from `items`, never edited
/// directly.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub guest_id: Option<GuestId>,
    pub session_token: Uuid,
    pub items: Json<Vec<CartItem>>,
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// The line items.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items.0
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.0.is_empty()
    }
}
