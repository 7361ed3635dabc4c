//! Checkout orchestrator.
//!
//! Sequences shipping-address capture, payment-method selection, and order
//! placement for both signed-in users and guests. Each missing prerequisite
//! points the client back at the step that collects it.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use oxcart_core::{AddressError, PaymentMethod, ShippingAddress, UserId};

use crate::config::PaymentConfig;
use crate::db::{CartRepository, GuestRepository, OrderRepository, RepositoryError, UserRepository};
use crate::models::Order;

/// A prerequisite the checkout is still missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingStep {
    /// Nothing in the cart.
    EmptyCart,
    /// No shipping address on file.
    ShippingAddress,
    /// No payment method chosen (and more than one is configured).
    PaymentMethod,
}

impl MissingStep {
    /// Where the client should go to supply the missing piece.
    #[must_use]
    pub const fn redirect_to(self) -> &'static str {
        match self {
            Self::EmptyCart => "/cart",
            Self::ShippingAddress => "/shipping-address",
            Self::PaymentMethod => "/payment-method",
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyCart => "Cart is empty",
            Self::ShippingAddress => "No shipping address",
            Self::PaymentMethod => "No payment method",
        }
    }
}

/// Errors from checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A prerequisite step hasn't been completed.
    #[error("{}", .0.message())]
    Missing(MissingStep),

    /// No cart exists for this session.
    #[error("cart session not found")]
    CartNotFound,

    /// Neither a signed-in user nor a linked guest identity.
    #[error("checkout identity not found")]
    IdentityNotFound,

    /// The chosen payment method isn't offered.
    #[error("payment method {0} is not available")]
    MethodNotOffered(PaymentMethod),

    /// The shipping address failed validation.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What the checkout pages need to know about the active identity.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutInfo {
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub is_signed_in: bool,
}

/// Decide whether an order may be placed, naming the first missing step.
///
/// A payment method is only demanded when more than one is configured; a
/// single-method shop applies that method implicitly.
pub(crate) const fn validate_readiness(
    cart_is_empty: bool,
    has_address: bool,
    has_payment_method: bool,
    configured_methods: usize,
) -> Result<(), MissingStep> {
    if cart_is_empty {
        return Err(MissingStep::EmptyCart);
    }
    if !has_address {
        return Err(MissingStep::ShippingAddress);
    }
    if !has_payment_method && configured_methods > 1 {
        return Err(MissingStep::PaymentMethod);
    }
    Ok(())
}

/// Checkout orchestrator.
pub struct CheckoutService<'a> {
    users: UserRepository<'a>,
    guests: GuestRepository<'a>,
    carts: CartRepository<'a>,
    orders: OrderRepository<'a>,
    payment: &'a PaymentConfig,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, payment: &'a PaymentConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            guests: GuestRepository::new(pool),
            carts: CartRepository::new(pool),
            orders: OrderRepository::new(pool),
            payment,
        }
    }

    /// Save a signed-in user's shipping address.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidAddress` for a malformed address, or
    /// `CheckoutError::Repository` on database failure.
    pub async fn save_user_address(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<(), CheckoutError> {
        address.validate()?;
        self.users.update_address(user_id, address).await?;
        Ok(())
    }

    /// Save a guest's shipping address, creating (or refreshing) the guest
    /// identity keyed by their email and linking it to the session cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidAddress` when the address is malformed
    /// or lacks a guest email, `CheckoutError::CartNotFound` without a
    /// session cart, or `CheckoutError::Repository` on database failure.
    pub async fn save_guest_address(
        &self,
        cart_token: Uuid,
        address: &ShippingAddress,
    ) -> Result<(), CheckoutError> {
        let email = address.validate_for_guest()?;

        let cart = self
            .carts
            .get_by_token(cart_token)
            .await?
            .ok_or(CheckoutError::CartNotFound)?;

        let guest = self
            .guests
            .upsert_with_address(email, &address.full_name, address)
            .await?;

        self.carts.link_guest(cart.id, guest.id).await?;
        Ok(())
    }

    /// Save a signed-in user's payment method choice.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MethodNotOffered` for a method the shop
    /// doesn't offer, or `CheckoutError::Repository` on database failure.
    pub async fn save_user_payment_method(
        &self,
        user_id: UserId,
        method: PaymentMethod,
    ) -> Result<(), CheckoutError> {
        self.ensure_offered(method)?;
        self.users.update_payment_method(user_id, method).await?;
        Ok(())
    }

    /// Save a guest's payment method choice (resolved via the session cart).
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MethodNotOffered` for an unoffered method,
    /// `CheckoutError::CartNotFound` / `CheckoutError::IdentityNotFound` when
    /// the session has no cart or the cart no guest, or
    /// `CheckoutError::Repository` on database failure.
    pub async fn save_guest_payment_method(
        &self,
        cart_token: Uuid,
        method: PaymentMethod,
    ) -> Result<(), CheckoutError> {
        self.ensure_offered(method)?;

        let cart = self
            .carts
            .get_by_token(cart_token)
            .await?
            .ok_or(CheckoutError::CartNotFound)?;
        let guest_id = cart.guest_id.ok_or(CheckoutError::IdentityNotFound)?;

        self.guests.update_payment_method(guest_id, method).await?;
        Ok(())
    }

    /// What the checkout pages should prefill for the active identity.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` on database failure.
    pub async fn checkout_info(
        &self,
        user_id: Option<UserId>,
        cart_token: Option<Uuid>,
    ) -> Result<CheckoutInfo, CheckoutError> {
        if let Some(user_id) = user_id {
            let user = self
                .users
                .get_by_id(user_id)
                .await?
                .ok_or(CheckoutError::IdentityNotFound)?;
            return Ok(CheckoutInfo {
                address: user.address,
                payment_method: user.payment_method,
                is_signed_in: true,
            });
        }

        if let Some(token) = cart_token
            && let Some(cart) = self.carts.get_by_token(token).await?
            && let Some(guest_id) = cart.guest_id
            && let Some(guest) = self.guests.get_by_id(guest_id).await?
        {
            return Ok(CheckoutInfo {
                address: guest.address,
                payment_method: guest.payment_method,
                is_signed_in: false,
            });
        }

        Ok(CheckoutInfo {
            address: None,
            payment_method: None,
            is_signed_in: false,
        })
    }

    /// Place an order from the session cart.
    ///
    /// Resolves the active identity (signed-in user, else the cart's guest),
    /// checks the checkout prerequisites, and atomically creates the order,
    /// copies the cart lines, and zeroes the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Missing` naming the first incomplete step,
    /// `CheckoutError::CartNotFound` / `CheckoutError::IdentityNotFound` for
    /// a missing cart or identity, or `CheckoutError::Repository` on
    /// database failure.
    pub async fn place_order(
        &self,
        cart_token: Uuid,
        user_id: Option<UserId>,
    ) -> Result<Order, CheckoutError> {
        let cart = self
            .carts
            .get_by_token(cart_token)
            .await?
            .ok_or(CheckoutError::Missing(MissingStep::EmptyCart))?;

        let (guest_id, address, chosen_method) = if let Some(user_id) = user_id {
            let user = self
                .users
                .get_by_id(user_id)
                .await?
                .ok_or(CheckoutError::IdentityNotFound)?;
            (None, user.address, user.payment_method)
        } else if let Some(guest_id) = cart.guest_id {
            let guest = self
                .guests
                .get_by_id(guest_id)
                .await?
                .ok_or(CheckoutError::IdentityNotFound)?;
            (Some(guest_id), guest.address, guest.payment_method)
        } else {
            // No identity at all: the shipping step is what collects one
            (None, None, None)
        };

        validate_readiness(
            cart.is_empty(),
            address.is_some(),
            chosen_method.is_some(),
            self.payment.methods.len(),
        )
        .map_err(CheckoutError::Missing)?;

        let address = address.ok_or(CheckoutError::Missing(MissingStep::ShippingAddress))?;
        let method = chosen_method.unwrap_or_else(|| self.payment.default_method());

        let order = self
            .orders
            .create_from_cart(&cart, user_id, guest_id, &address, method)
            .await?;

        tracing::info!(order_id = %order.id, total = %order.total_price, "Order placed");

        Ok(order)
    }

    fn ensure_offered(&self, method: PaymentMethod) -> Result<(), CheckoutError> {
        if self.payment.methods.contains(&method) {
            Ok(())
        } else {
            Err(CheckoutError::MethodNotOffered(method))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_empty_cart_first() {
        assert_eq!(
            validate_readiness(true, false, false, 3),
            Err(MissingStep::EmptyCart)
        );
    }

    #[test]
    fn test_readiness_requires_address() {
        assert_eq!(
            validate_readiness(false, false, true, 3),
            Err(MissingStep::ShippingAddress)
        );
    }

    #[test]
    fn test_readiness_requires_method_when_several_configured() {
        assert_eq!(
            validate_readiness(false, true, false, 3),
            Err(MissingStep::PaymentMethod)
        );
    }

    #[test]
    fn test_readiness_single_method_shop_skips_method_step() {
        assert_eq!(validate_readiness(false, true, false, 1), Ok(()));
    }

    #[test]
    fn test_readiness_complete() {
        assert_eq!(validate_readiness(false, true, true, 3), Ok(()));
    }

    #[test]
    fn test_missing_step_redirects() {
        assert_eq!(MissingStep::EmptyCart.redirect_to(), "/cart");
        assert_eq!(MissingStep::ShippingAddress.redirect_to(), "/shipping-address");
        assert_eq!(MissingStep::PaymentMethod.redirect_to(), "/payment-method");
    }
}
