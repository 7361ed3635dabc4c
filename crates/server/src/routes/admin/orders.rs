//! Admin order management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use oxcart_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::routes::{ActionResponse, PAGE_SIZE, PageQuery, Paginated};
use crate::services::FulfillmentService;
use crate::state::AppState;

/// Tracking number payload.
#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub tracking_number: String,
}

fn fulfillment(state: &AppState) -> FulfillmentService<'_> {
    FulfillmentService::new(state.pool(), state.email().clone())
}

/// All orders, newest first, optionally filtered by purchaser name.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<crate::models::AdminOrderRow>>> {
    let orders = OrderRepository::new(state.pool());

    let data = orders
        .list_all(page.filter(), PAGE_SIZE, page.offset())
        .await?;
    let total = orders.count().await?;

    Ok(Json(Paginated::new(data, total, PAGE_SIZE)))
}

/// Dashboard aggregate: counts, total and monthly sales, latest sales.
#[instrument(skip(state, _admin))]
pub async fn summary(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<crate::models::OrderSummary>> {
    let summary = OrderRepository::new(state.pool()).summary().await?;
    Ok(Json(summary))
}

/// Delete an order.
#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<ActionResponse>> {
    let deleted = OrderRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("order {id}")));
    }

    Ok(Json(ActionResponse::ok("Order deleted successfully")))
}

/// Delete unpaid orders older than 24 hours.
#[instrument(skip(state, _admin))]
pub async fn purge_unpaid(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ActionResponse>> {
    let removed = fulfillment(&state).purge_stale_unpaid().await?;

    Ok(Json(ActionResponse::ok(format!(
        "{removed} unpaid orders deleted successfully"
    ))))
}

/// Mark a cash-on-delivery order paid.
#[instrument(skip(state, _admin))]
pub async fn mark_paid(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<ActionResponse>> {
    fulfillment(&state).mark_paid(id, None).await?;
    Ok(Json(ActionResponse::ok("Order marked as paid")))
}

/// Mark a paid order delivered.
#[instrument(skip(state, _admin))]
pub async fn deliver(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<ActionResponse>> {
    fulfillment(&state).mark_delivered(id).await?;
    Ok(Json(ActionResponse::ok("Order marked as delivered")))
}

/// Attach a tracking number (sends the shipment email).
#[instrument(skip(state, _admin, request))]
pub async fn set_tracking(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
    Json(request): Json<TrackingRequest>,
) -> Result<Json<ActionResponse>> {
    fulfillment(&state)
        .set_tracking(id, &request.tracking_number)
        .await?;
    Ok(Json(ActionResponse::ok("Tracking number added successfully")))
}

/// Remove the tracking number (Shipped regresses to Paid).
#[instrument(skip(state, _admin))]
pub async fn remove_tracking(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<ActionResponse>> {
    fulfillment(&state).remove_tracking(id).await?;
    Ok(Json(ActionResponse::ok(
        "Tracking number removed successfully",
    )))
}
