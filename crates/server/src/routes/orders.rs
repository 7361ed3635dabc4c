//! Order route handlers: order pages, PayPal/Stripe payment, webhook
//! reconciliation.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use oxcart_core::{Email, OrderId, PaymentReceipt};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{OptionalUser, RequireUser};
use crate::routes::{ActionResponse, PAGE_SIZE, PageQuery, Paginated};
use crate::services::FulfillmentService;
use crate::services::payments::paypal::verify_capture;
use crate::state::AppState;

/// Guest order lookup payload.
#[derive(Debug, Deserialize)]
pub struct FindOrderRequest {
    pub order_id: OrderId,
    pub email: String,
}

/// PayPal capture payload: the provider order id approved in the browser.
#[derive(Debug, Deserialize)]
pub struct PayPalCaptureRequest {
    pub provider_order_id: String,
}

/// My paid orders, newest first.
#[instrument(skip(state, user))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<crate::models::Order>>> {
    let orders = OrderRepository::new(state.pool());

    let data = orders
        .list_for_user(user.id, PAGE_SIZE, page.offset())
        .await?;
    let total = orders.count_for_user(user.id).await?;

    Ok(Json(Paginated::new(data, total, PAGE_SIZE)))
}

/// Show an order.
///
/// Visible to its owner and to admins; guest orders (no owning user) are
/// reachable by their id link alone, which is how the confirmation page
/// works for guests.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<OrderId>,
) -> Result<Json<crate::models::OrderDetail>> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let authorized = match &detail.order.user_id {
        Some(owner) => user
            .as_ref()
            .is_some_and(|u| u.id == *owner || u.is_admin()),
        None => true,
    };
    if !authorized {
        return Err(AppError::Forbidden("not your order".to_owned()));
    }

    Ok(Json(detail))
}

/// Guest order tracking: look an order up by id + email.
#[instrument(skip(state, request))]
pub async fn find(
    State(state): State<AppState>,
    Json(request): Json<FindOrderRequest>,
) -> Result<Json<ActionResponse>> {
    let email = Email::parse(&request.email)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let order = OrderRepository::new(state.pool())
        .find_by_id_and_email(request.order_id, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("no order matches that id and email".to_owned()))?;

    Ok(Json(ActionResponse::ok_redirect(
        "Order found",
        format!("/order/{}", order.id),
    )))
}

/// Create a PayPal provider order for this order's total.
///
/// The provider order id is stored as a pending payment result; capture will
/// be verified against it.
#[instrument(skip(state))]
pub async fn paypal_create(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<ActionResponse>> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if order.is_paid {
        return Err(AppError::BadRequest("Order is already paid".to_owned()));
    }

    let provider_order = state.paypal().create_order(order.total_price).await?;

    orders
        .set_payment_result(id, &PaymentReceipt::pending(&provider_order.id))
        .await?;

    Ok(Json(ActionResponse::ok_data(
        "PayPal order created",
        serde_json::json!(provider_order.id),
    )))
}

/// Capture an approved PayPal order and mark the order paid.
///
/// The capture is trusted only when the provider order id matches the stored
/// pending id and PayPal reports it `COMPLETED`.
#[instrument(skip(state, request))]
pub async fn paypal_capture(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(request): Json<PayPalCaptureRequest>,
) -> Result<Json<ActionResponse>> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let pending_id = order
        .payment_result
        .as_ref()
        .map(|receipt| receipt.id.clone())
        .ok_or_else(|| AppError::BadRequest("no pending PayPal order".to_owned()))?;

    let capture = state
        .paypal()
        .capture_order(&request.provider_order_id)
        .await?;

    let receipt = verify_capture(&capture, &pending_id)?;

    FulfillmentService::new(state.pool(), state.email().clone())
        .mark_paid(id, Some(receipt))
        .await?;

    Ok(Json(ActionResponse::ok("Order has been paid")))
}

/// Create a Stripe payment intent for this order's total.
#[instrument(skip(state))]
pub async fn stripe_intent(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<ActionResponse>> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if order.is_paid {
        return Err(AppError::BadRequest("Order is already paid".to_owned()));
    }

    let intent = state
        .stripe()
        .create_payment_intent(id, order.total_price)
        .await?;

    orders
        .set_payment_result(id, &PaymentReceipt::pending(&intent.id))
        .await?;

    Ok(Json(ActionResponse::ok_data(
        "Payment intent created",
        serde_json::json!({ "client_secret": intent.client_secret }),
    )))
}

/// Stripe webhook: server-side payment reconciliation.
///
/// `payment_intent.succeeded` marks the referenced order paid even when the
/// client never came back after confirming. Duplicate deliveries hit the
/// paid-once guard and are acknowledged without effect.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing Stripe-Signature header".to_owned()))?;

    let event = state
        .stripe()
        .parse_webhook(&body, signature, Utc::now().timestamp())?;

    if !event.is_payment_succeeded() {
        tracing::debug!(event_type = %event.event_type, "Ignoring Stripe event");
        return Ok("ignored");
    }

    let order_id = event.order_id()?;
    let receipt = event.receipt();

    let fulfillment = FulfillmentService::new(state.pool(), state.email().clone());
    match fulfillment.mark_paid(order_id, Some(receipt)).await {
        Ok(_) => Ok("ok"),
        // Stripe retries deliveries; an already-paid order is a success here
        Err(crate::services::FulfillmentError::AlreadyPaid) => Ok("ok"),
        Err(e) => Err(e.into()),
    }
}
