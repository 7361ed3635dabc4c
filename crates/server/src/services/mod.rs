//! Business services.
//!
//! Services own the multi-step flows (checkout, payment capture,
//! fulfillment); repositories stay single-purpose underneath them.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod fulfillment;
pub mod payments;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService, CartTotals};
pub use checkout::{CheckoutError, CheckoutService, MissingStep};
pub use email::{EmailError, EmailService};
pub use fulfillment::{FulfillmentError, FulfillmentService};
pub use payments::{PayPalClient, PaymentError, StripeClient};
