//! Order models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use oxcart_core::{
    Email, GuestId, Money, OrderId, OrderStatus, PaymentMethod, PaymentReceipt, ProductId,
    ShippingAddress, UserId,
};

/// An order: an immutable snapshot of address and prices taken at place-order
/// time, mutated only by payment/fulfillment transitions.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub guest_id: Option<GuestId>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
    pub payment_result: Option<PaymentReceipt>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Where the order sits in `Created -> Paid -> Shipped -> Delivered`.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        OrderStatus::derive(self.is_paid, self.tracking_number.is_some(), self.is_delivered)
    }
}

/// A line of an order - a denormalized copy of product fields at order time,
/// decoupling historical orders from later catalog edits.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub qty: i32,
    pub price: Money,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub size: Option<String>,
}

/// Who placed the order (registered user or guest).
///
/// Both fields are `None` when the purchasing account was deleted after the
/// order was placed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Purchaser {
    pub name: Option<String>,
    pub email: Option<Email>,
}

/// An order with its items and purchaser, as shown on the order page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub purchaser: Purchaser,
    pub status: OrderStatus,
}

impl OrderDetail {
    /// Assemble the detail view, deriving the status once.
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>, purchaser: Purchaser) -> Self {
        let status = order.status();
        Self {
            order,
            items,
            purchaser,
            status,
        }
    }
}

/// Condensed order row for the admin list and dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminOrderRow {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Purchaser display name; `None` for deleted accounts.
    pub purchaser_name: Option<String>,
}

/// One month's sales, bucketed as `MM/YY`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesBucket {
    pub month: String,
    pub total_sales: Money,
}

/// The admin dashboard aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub orders_count: i64,
    pub products_count: i64,
    pub users_count: i64,
    pub total_sales: Money,
    pub sales_data: Vec<SalesBucket>,
    pub latest_sales: Vec<AdminOrderRow>,
}
