//! Order repository.
//!
//! Orders are written once at checkout and then touched only by the
//! payment/fulfillment transitions. The two multi-statement writes - order
//! placement and mark-paid - each run inside a single transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use oxcart_core::{Email, GuestId, OrderId, PaymentMethod, PaymentReceipt, ProductId, UserId};

use super::RepositoryError;
use crate::models::{AdminOrderRow, Cart, Order, OrderDetail, OrderItem, OrderSummary, Purchaser, SalesBucket};

const ORDER_COLUMNS: &str = "id, user_id, guest_id, shipping_address, payment_method, \
     items_price, shipping_price, tax_price, total_price, payment_result, \
     is_paid, paid_at, is_delivered, delivered_at, tracking_number, created_at";

const ORDER_ITEM_COLUMNS: &str = "order_id, product_id, qty, price, name, slug, image, size";

const ADMIN_ROW_SELECT: &str = "SELECT o.id, o.created_at, o.total_price, o.is_paid, o.paid_at, \
         o.is_delivered, o.delivered_at, COALESCE(u.name, g.name) AS purchaser_name \
     FROM orders o \
     LEFT JOIN users u ON o.user_id = u.id \
     LEFT JOIN guest_users g ON o.guest_id = g.id";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from a cart snapshot: insert the order row, copy the
    /// cart lines into `order_items`, and zero the cart - all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create_from_cart(
        &self,
        cart: &Cart,
        user_id: Option<UserId>,
        guest_id: Option<GuestId>,
        address: &oxcart_core::ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders
                 (user_id, guest_id, shipping_address, payment_method,
                  items_price, shipping_price, tax_price, total_price)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(guest_id)
        .bind(address)
        .bind(payment_method)
        .bind(cart.items_price)
        .bind(cart.shipping_price)
        .bind(cart.tax_price)
        .bind(cart.total_price)
        .fetch_one(&mut *tx)
        .await?;

        for item in cart.items() {
            sqlx::query(
                "INSERT INTO order_items
                     (order_id, product_id, qty, price, name, slug, image, size)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.qty)
            .bind(item.price)
            .bind(&item.name)
            .bind(&item.slug)
            .bind(&item.image)
            .bind(&item.size)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE carts
             SET items = '[]'::jsonb, items_price = 0, shipping_price = 0,
                 tax_price = 0, total_price = 0, updated_at = now()
             WHERE id = $1",
        )
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order with its items and purchaser.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.items_for(id).await?;

        let purchaser = sqlx::query_as::<_, Purchaser>(
            "SELECT COALESCE(u.name, g.name) AS name, COALESCE(u.email, g.email) AS email
             FROM orders o
             LEFT JOIN users u ON o.user_id = u.id
             LEFT JOIN guest_users g ON o.guest_id = g.id
             WHERE o.id = $1",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(Some(OrderDetail::new(order, items, purchaser)))
    }

    /// The items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY name"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Store a (pending or final) payment receipt on the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_payment_result(
        &self,
        id: OrderId,
        receipt: &PaymentReceipt,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET payment_result = $1 WHERE id = $2")
            .bind(receipt)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Transition an order to paid, decrementing product stock for each line.
    ///
    /// The order row is locked (`FOR UPDATE`) before the paid check so two
    /// concurrent captures cannot both pass it; the loser of the race sees
    /// `is_paid = TRUE` and gets a conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the order is already paid.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        receipt: Option<&PaymentReceipt>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let is_paid: Option<bool> =
            sqlx::query_scalar("SELECT is_paid FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let is_paid = is_paid.ok_or(RepositoryError::NotFound)?;
        if is_paid {
            return Err(RepositoryError::Conflict("order is already paid".to_owned()));
        }

        let lines: Vec<(ProductId, i32)> =
            sqlx::query_as("SELECT product_id, qty FROM order_items WHERE order_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        for (product_id, qty) in lines {
            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(qty)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE orders
             SET is_paid = TRUE, paid_at = now(),
                 payment_result = COALESCE($1, payment_result)
             WHERE id = $2",
        )
        .bind(receipt.cloned())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Transition a paid order to delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no paid order matches.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET is_delivered = TRUE, delivered_at = now()
             WHERE id = $1 AND is_paid",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Attach a tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_tracking(
        &self,
        id: OrderId,
        tracking_number: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET tracking_number = $1 WHERE id = $2")
            .bind(tracking_number)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove the tracking number, regressing Shipped (and a premature
    /// Delivered) back to Paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn remove_tracking(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET tracking_number = NULL, is_delivered = FALSE, delivered_at = NULL
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// A user's paid orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = $1 AND is_paid
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Count all orders of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Admin list: all orders, newest first, optionally filtered by
    /// purchaser name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        purchaser_name: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminOrderRow>, RepositoryError> {
        let pattern = purchaser_name.map(|q| format!("%{q}%"));

        let orders = sqlx::query_as::<_, AdminOrderRow>(&format!(
            "{ADMIN_ROW_SELECT}
             WHERE $1::text IS NULL OR u.name ILIKE $1
             ORDER BY o.created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Count all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Guest order tracking: an order matching both id and purchaser email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id_and_email(
        &self,
        id: OrderId,
        email: &Email,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders o
             LEFT JOIN users u ON o.user_id = u.id
             LEFT JOIN guest_users g ON o.guest_id = g.id
             WHERE o.id = $1 AND (u.email = $2 OR g.email = $2)",
            qualified_order_columns()
        ))
        .bind(id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Delete an order.
    ///
    /// # Returns
    ///
    /// Returns `true` if the order was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete unpaid orders created before the cutoff. Paid orders and
    /// anything newer are untouched.
    ///
    /// # Returns
    ///
    /// The number of orders removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_stale_unpaid(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE NOT is_paid AND created_at < $1")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// The admin dashboard aggregate: entity counts, total and monthly
    /// sales, and the latest six orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn summary(&self) -> Result<OrderSummary, RepositoryError> {
        let orders_count = self.count().await?;

        let products_count: i64 = sqlx::query_scalar("SELECT count(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        let users_count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        let total_sales = sqlx::query_scalar(
            "SELECT COALESCE(sum(total_price), 0)::numeric(12,2) FROM orders",
        )
        .fetch_one(self.pool)
        .await?;

        let sales_data = sqlx::query_as::<_, SalesBucket>(
            "SELECT to_char(created_at, 'MM/YY') AS month,
                    COALESCE(sum(total_price), 0)::numeric(12,2) AS total_sales
             FROM orders
             GROUP BY to_char(created_at, 'MM/YY')
             ORDER BY min(created_at)",
        )
        .fetch_all(self.pool)
        .await?;

        let latest_sales = self.list_all(None, 6, 0).await?;

        Ok(OrderSummary {
            orders_count,
            products_count,
            users_count,
            total_sales,
            sales_data,
            latest_sales,
        })
    }
}

/// `ORDER_COLUMNS` qualified with the `o.` alias for joined queries.
fn qualified_order_columns() -> String {
    ORDER_COLUMNS
        .split(", ")
        .map(|col| format!("o.{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_order_columns() {
        let qualified = qualified_order_columns();
        assert!(qualified.starts_with("o.id, o.user_id"));
        assert!(qualified.ends_with("o.created_at"));
        assert!(!qualified.contains("o.o."));
    }
}
