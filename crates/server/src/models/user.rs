//! User and guest identity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use oxcart_core::{Email, GuestId, PaymentMethod, ShippingAddress, UserId, UserRole};

/// A registered account.
///
/// The password hash is deliberately not part of this struct; credential
/// queries return it separately so it never rides along into responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An anonymous checkout identity, keyed by email.
///
/// Holds the address and payment method a guest entered, linked to their cart
/// until a registered user claims it at sign-in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuestUser {
    pub id: GuestId,
    pub email: Email,
    pub name: String,
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

/// The signed-in user as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
}

impl CurrentUser {
    /// Whether this user may access the `/admin` back-office.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
