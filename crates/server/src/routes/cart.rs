//! Cart route handlers.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use oxcart_core::{Money, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::auth::OptionalUser;
use crate::middleware::session::{cart_token, ensure_cart_token};
use crate::models::{Cart, CartItem};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
}

impl CartView {
    /// An empty cart (before the session ever touched one).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            items_price: Money::ZERO,
            shipping_price: Money::ZERO,
            tax_price: Money::ZERO,
            total_price: Money::ZERO,
        }
    }
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            items: cart.items.0,
            items_price: cart.items_price,
            shipping_price: cart.shipping_price,
            tax_price: cart.tax_price,
            total_price: cart.total_price,
        }
    }
}

/// Add to cart payload.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub qty: Option<i32>,
}

/// Remove from cart payload.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Show the session's cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let Some(token) = cart_token(&session).await else {
        return Ok(Json(CartView::empty()));
    };

    let cart = CartService::new(state.pool()).get(token).await?;

    Ok(Json(cart.map_or_else(CartView::empty, CartView::from)))
}

/// Add an item to the cart, creating the cart on first touch.
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let qty = request.qty.unwrap_or(1);
    if qty < 1 {
        return Err(AppError::BadRequest("quantity must be positive".to_owned()));
    }

    let token = ensure_cart_token(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let cart = CartService::new(state.pool())
        .add_item(token, user.map(|u| u.id), request.product_id, qty)
        .await?;

    Ok(Json(CartView::from(cart)))
}

/// Remove one unit of an item from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let Some(token) = cart_token(&session).await else {
        return Ok(Json(CartView::empty()));
    };

    let cart = CartService::new(state.pool())
        .remove_item(token, request.product_id)
        .await?;

    Ok(Json(CartView::from(cart)))
}
