//! Shared domain types.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod payment;
pub mod status;

pub use address::{AddressError, ShippingAddress};
pub use email::{Email, EmailError};
pub use id::{CartId, GuestId, OrderId, ProductId, ReviewId, UserId};
pub use money::Money;
pub use payment::PaymentReceipt;
pub use status::{OrderStatus, PaymentMethod, UserRole};
