//! Order fulfillment: payment transitions, delivery, tracking numbers.
//!
//! Transitions follow `Created -> Paid -> Shipped -> Delivered`. Mark-paid is
//! the only transition that touches stock, and it happens exactly once per
//! order (enforced by a row lock in the repository). Notification emails are
//! fire-and-forget - a failed send is logged, never retried, and never fails
//! the transition.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;

use oxcart_core::{OrderId, PaymentReceipt};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::OrderDetail;
use crate::services::email::EmailService;

/// Unpaid orders older than this are eligible for admin cleanup.
const STALE_UNPAID_HOURS: i64 = 24;

/// Errors from fulfillment transitions.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// No such order.
    #[error("order not found")]
    NotFound,

    /// The order was already marked paid.
    #[error("order is already paid")]
    AlreadyPaid,

    /// Delivery requires payment first.
    #[error("order is not paid")]
    NotPaid,

    /// A tracking number must be non-empty.
    #[error("tracking number is required")]
    EmptyTrackingNumber,

    /// Cleanup found nothing to remove.
    #[error("no unpaid orders older than {STALE_UNPAID_HOURS}h")]
    NoStaleUnpaidOrders,

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Fulfillment service.
pub struct FulfillmentService<'a> {
    orders: OrderRepository<'a>,
    email: EmailService,
}

impl<'a> FulfillmentService<'a> {
    /// Create a new fulfillment service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: EmailService) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            email,
        }
    }

    /// Mark an order paid, decrementing stock atomically, and send the
    /// purchase receipt.
    ///
    /// Passing `None` as the receipt is the cash-on-delivery path.
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::AlreadyPaid` on a repeat attempt,
    /// `FulfillmentError::NotFound` for an unknown order, or
    /// `FulfillmentError::Repository` on database failure.
    pub async fn mark_paid(
        &self,
        order_id: OrderId,
        receipt: Option<PaymentReceipt>,
    ) -> Result<OrderDetail, FulfillmentError> {
        self.orders
            .mark_paid(order_id, receipt.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => FulfillmentError::AlreadyPaid,
                RepositoryError::NotFound => FulfillmentError::NotFound,
                other => FulfillmentError::Repository(other),
            })?;

        let detail = self
            .orders
            .get_detail(order_id)
            .await?
            .ok_or(FulfillmentError::NotFound)?;

        tracing::info!(order_id = %order_id, "Order marked paid");
        self.notify_receipt(&detail);

        Ok(detail)
    }

    /// Mark a paid order delivered.
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::NotPaid` when the order hasn't been paid,
    /// `FulfillmentError::NotFound` for an unknown order, or
    /// `FulfillmentError::Repository` on database failure.
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<(), FulfillmentError> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(FulfillmentError::NotFound)?;

        if !order.is_paid {
            return Err(FulfillmentError::NotPaid);
        }

        self.orders.mark_delivered(order_id).await?;
        tracing::info!(order_id = %order_id, "Order marked delivered");

        Ok(())
    }

    /// Attach a tracking number (Paid -> Shipped) and send the shipment
    /// notification.
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::EmptyTrackingNumber` for a blank number,
    /// `FulfillmentError::NotFound` for an unknown order, or
    /// `FulfillmentError::Repository` on database failure.
    pub async fn set_tracking(
        &self,
        order_id: OrderId,
        tracking_number: &str,
    ) -> Result<OrderDetail, FulfillmentError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(FulfillmentError::EmptyTrackingNumber);
        }

        self.orders
            .set_tracking(order_id, tracking_number)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => FulfillmentError::NotFound,
                other => FulfillmentError::Repository(other),
            })?;

        let detail = self
            .orders
            .get_detail(order_id)
            .await?
            .ok_or(FulfillmentError::NotFound)?;

        self.notify_shipped(&detail);

        Ok(detail)
    }

    /// Remove the tracking number (Shipped -> Paid).
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::NotFound` for an unknown order, or
    /// `FulfillmentError::Repository` on database failure.
    pub async fn remove_tracking(&self, order_id: OrderId) -> Result<(), FulfillmentError> {
        self.orders
            .remove_tracking(order_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => FulfillmentError::NotFound,
                other => FulfillmentError::Repository(other),
            })
    }

    /// Delete unpaid orders older than 24 hours.
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::NoStaleUnpaidOrders` when nothing
    /// qualified, or `FulfillmentError::Repository` on database failure.
    pub async fn purge_stale_unpaid(&self) -> Result<u64, FulfillmentError> {
        let cutoff = Utc::now() - Duration::hours(STALE_UNPAID_HOURS);
        let removed = self.orders.delete_stale_unpaid(cutoff).await?;

        if removed == 0 {
            return Err(FulfillmentError::NoStaleUnpaidOrders);
        }

        tracing::info!(removed, "Purged stale unpaid orders");
        Ok(removed)
    }

    /// Fire-and-forget purchase receipt.
    fn notify_receipt(&self, detail: &OrderDetail) {
        let Some(to) = detail.purchaser.email.clone() else {
            tracing::warn!(order_id = %detail.order.id, "No purchaser email, skipping receipt");
            return;
        };
        let email = self.email.clone();
        let detail = detail.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_purchase_receipt(&to, &detail).await {
                tracing::warn!(order_id = %detail.order.id, "Failed to send receipt: {e}");
            }
        });
    }

    /// Fire-and-forget shipment notification.
    fn notify_shipped(&self, detail: &OrderDetail) {
        let Some(to) = detail.purchaser.email.clone() else {
            tracing::warn!(order_id = %detail.order.id, "No purchaser email, skipping notice");
            return;
        };
        let email = self.email.clone();
        let detail = detail.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_order_shipped(&to, &detail).await {
                tracing::warn!(order_id = %detail.order.id, "Failed to send shipping notice: {e}");
            }
        });
    }
}
