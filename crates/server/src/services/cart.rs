//! Cart service: line-item mutations and total recomputation.

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;
use uuid::Uuid;

use oxcart_core::{Money, ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{Cart, CartItem, Product};

/// Orders above this item subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

/// Flat shipping price below the free-shipping threshold.
const SHIPPING_PRICE_CENTS: i64 = 10_00;

/// Sales tax rate applied to the item subtotal (15%).
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product being added doesn't exist.
    #[error("product not found")]
    ProductNotFound,

    /// Not enough stock to satisfy the requested quantity.
    #[error("not enough stock: only {available} left")]
    OutOfStock {
        /// Units still available.
        available: i32,
    },

    /// The product isn't in the cart.
    #[error("item not in cart")]
    ItemNotInCart,

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The four derived price columns of a cart.
///
/// Computed from the line items alone; nothing else may write these columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
}

impl CartTotals {
    /// Recompute totals from line items.
    ///
    /// Items price is the sum of `price * qty`; shipping is free above
    /// [`FREE_SHIPPING_THRESHOLD`], otherwise a flat $10; tax is 15% of the
    /// item subtotal. An empty cart totals to zero across the board.
    #[must_use]
    pub fn compute(items: &[CartItem]) -> Self {
        let items_price: Money = items.iter().map(|item| item.price * item.qty).sum();

        if items_price.is_zero() {
            return Self::zero();
        }

        let shipping_price = if items_price.amount() > FREE_SHIPPING_THRESHOLD {
            Money::ZERO
        } else {
            Money::from_cents(SHIPPING_PRICE_CENTS)
        };
        let tax_price = Money::from_decimal(items_price.amount() * TAX_RATE);
        let total_price = items_price + shipping_price + tax_price;

        Self {
            items_price,
            shipping_price,
            tax_price,
            total_price,
        }
    }

    /// All-zero totals (empty cart).
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            items_price: Money::ZERO,
            shipping_price: Money::ZERO,
            tax_price: Money::ZERO,
            total_price: Money::ZERO,
        }
    }
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Get the session's cart, creating an empty one on first touch.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn get_or_create(
        &self,
        token: Uuid,
        user_id: Option<UserId>,
    ) -> Result<Cart, CartError> {
        if let Some(cart) = self.carts.get_by_token(token).await? {
            return Ok(cart);
        }
        Ok(self.carts.create(token, user_id).await?)
    }

    /// The session's cart, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn get(&self, token: Uuid) -> Result<Option<Cart>, CartError> {
        Ok(self.carts.get_by_token(token).await?)
    }

    /// Add `qty` units of a product to the cart (bumping an existing line).
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for an unknown product,
    /// `CartError::OutOfStock` when the resulting quantity exceeds stock,
    /// or `CartError::Repository` on database failure.
    pub async fn add_item(
        &self,
        token: Uuid,
        user_id: Option<UserId>,
        product_id: ProductId,
        qty: i32,
    ) -> Result<Cart, CartError> {
        let product = self
            .products
            .get_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        let mut cart = self.get_or_create(token, user_id).await?;
        let mut items = cart.items().to_vec();

        let requested = items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(qty, |item| item.qty + qty);

        if requested > product.stock {
            return Err(CartError::OutOfStock {
                available: product.stock,
            });
        }

        match items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.qty = requested,
            None => items.push(new_line(&product, qty)),
        }

        self.persist(&mut cart, items).await?;
        Ok(cart)
    }

    /// Remove one unit of a product, dropping the line at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotInCart` when the product isn't in the cart,
    /// or `CartError::Repository` on database failure.
    pub async fn remove_item(
        &self,
        token: Uuid,
        product_id: ProductId,
    ) -> Result<Cart, CartError> {
        let mut cart = self
            .carts
            .get_by_token(token)
            .await?
            .ok_or(CartError::ItemNotInCart)?;

        let mut items = cart.items().to_vec();
        let line = items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(CartError::ItemNotInCart)?;

        line.qty -= 1;
        items.retain(|item| item.qty > 0);

        self.persist(&mut cart, items).await?;
        Ok(cart)
    }

    /// Write items + recomputed totals back, mirroring them onto `cart`.
    async fn persist(&self, cart: &mut Cart, items: Vec<CartItem>) -> Result<(), CartError> {
        let totals = CartTotals::compute(&items);
        self.carts.save_items(cart.id, &items, &totals).await?;

        cart.items = Json(items);
        cart.items_price = totals.items_price;
        cart.shipping_price = totals.shipping_price;
        cart.tax_price = totals.tax_price;
        cart.total_price = totals.total_price;
        Ok(())
    }
}

/// Denormalize a product into a fresh cart line.
fn new_line(product: &Product, qty: i32) -> CartItem {
    CartItem {
        product_id: product.id,
        name: product.name.clone(),
        slug: product.slug.clone(),
        image: product.images.first().cloned().unwrap_or_default(),
        price: product.price,
        qty,
        size: product.size.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(cents: i64, qty: i32) -> CartItem {
        CartItem {
            product_id: ProductId::generate(),
            name: "Test Shirt".to_owned(),
            slug: "test-shirt".to_owned(),
            image: "/images/test.jpg".to_owned(),
            price: Money::from_cents(cents),
            qty,
            size: None,
        }
    }

    #[test]
    fn test_totals_empty_cart_is_all_zero() {
        let totals = CartTotals::compute(&[]);
        assert_eq!(totals, CartTotals::zero());
    }

    #[test]
    fn test_totals_below_threshold_pay_shipping() {
        // 2 x $19.99 = $39.98 items, $10 shipping, $6.00 tax (15%, rounded)
        let totals = CartTotals::compute(&[item(19_99, 2)]);
        assert_eq!(totals.items_price, Money::from_cents(39_98));
        assert_eq!(totals.shipping_price, Money::from_cents(10_00));
        assert_eq!(totals.tax_price, Money::from_cents(6_00));
        assert_eq!(totals.total_price, Money::from_cents(55_98));
    }

    #[test]
    fn test_totals_above_threshold_ship_free() {
        let totals = CartTotals::compute(&[item(60_00, 2)]);
        assert_eq!(totals.items_price, Money::from_cents(120_00));
        assert_eq!(totals.shipping_price, Money::ZERO);
        assert_eq!(totals.tax_price, Money::from_cents(18_00));
        assert_eq!(totals.total_price, Money::from_cents(138_00));
    }

    #[test]
    fn test_totals_exactly_at_threshold_pay_shipping() {
        // Free shipping starts strictly above $100
        let totals = CartTotals::compute(&[item(100_00, 1)]);
        assert_eq!(totals.shipping_price, Money::from_cents(10_00));
    }

    #[test]
    fn test_totals_tax_rounding() {
        // $19.99 -> tax 2.9985 -> $3.00
        let totals = CartTotals::compute(&[item(19_99, 1)]);
        assert_eq!(totals.tax_price, Money::from_cents(3_00));
    }

    #[test]
    fn test_totals_sum_across_lines() {
        let totals = CartTotals::compute(&[item(10_00, 1), item(25_50, 2)]);
        assert_eq!(totals.items_price, Money::from_cents(61_00));
    }
}
