//! Checkout route handlers: shipping address, payment method, place-order.

use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use oxcart_core::{PaymentMethod, ShippingAddress};

use crate::error::{AppError, Result};
use crate::middleware::auth::OptionalUser;
use crate::middleware::session::cart_token;
use crate::routes::ActionResponse;
use crate::services::checkout::{CheckoutError, CheckoutInfo, CheckoutService};
use crate::state::AppState;

/// Payment method payload (`{"type": "paypal"}`).
#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    #[serde(rename = "type")]
    pub method: String,
}

/// What the checkout pages should prefill.
#[instrument(skip(state, session, user))]
pub async fn info(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<CheckoutInfo>> {
    let token = cart_token(&session).await;
    let info = CheckoutService::new(state.pool(), &state.config().payment)
        .checkout_info(user.map(|u| u.id), token)
        .await?;
    Ok(Json(info))
}

/// Save the shipping address for the active identity.
///
/// A signed-in user's address lands on their account; a guest's creates (or
/// refreshes) a guest identity keyed by the address's `guest_email` and links
/// it to the session cart.
#[instrument(skip(state, session, user, address))]
pub async fn save_shipping_address(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<ActionResponse>> {
    let checkout = CheckoutService::new(state.pool(), &state.config().payment);

    if let Some(user) = user {
        checkout.save_user_address(user.id, &address).await?;
    } else {
        let token = cart_token(&session)
            .await
            .ok_or(AppError::Checkout(CheckoutError::CartNotFound))?;
        checkout.save_guest_address(token, &address).await?;
    }

    Ok(Json(ActionResponse::ok_redirect(
        "Address updated successfully",
        "/payment-method",
    )))
}

/// Save the payment method for the active identity.
#[instrument(skip(state, session, user))]
pub async fn save_payment_method(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<Json<ActionResponse>> {
    let method: PaymentMethod = request
        .method
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let checkout = CheckoutService::new(state.pool(), &state.config().payment);

    if let Some(user) = user {
        checkout.save_user_payment_method(user.id, method).await?;
    } else {
        let token = cart_token(&session)
            .await
            .ok_or(AppError::Checkout(CheckoutError::CartNotFound))?;
        checkout.save_guest_payment_method(token, method).await?;
    }

    Ok(Json(ActionResponse::ok_redirect(
        "Payment method updated successfully",
        "/place-order",
    )))
}

/// Place the order.
///
/// A missing prerequisite is not an error: the client gets
/// `{success: false, redirect_to}` pointing at the step that collects it.
#[instrument(skip(state, session, user))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<ActionResponse>> {
    let Some(token) = cart_token(&session).await else {
        return Ok(Json(ActionResponse::missing_step(
            crate::services::checkout::MissingStep::EmptyCart,
        )));
    };

    let checkout = CheckoutService::new(state.pool(), &state.config().payment);

    match checkout.place_order(token, user.map(|u| u.id)).await {
        Ok(order) => Ok(Json(ActionResponse::ok_redirect(
            "Order created",
            format!("/order/{}", order.id),
        ))),
        Err(CheckoutError::Missing(step)) => Ok(Json(ActionResponse::missing_step(step))),
        Err(other) => Err(other.into()),
    }
}
