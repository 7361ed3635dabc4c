//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Account role, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// How an order will be (or was) paid, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    PayPal,
    Stripe,
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PayPal => write!(f, "paypal"),
            Self::Stripe => write!(f, "stripe"),
            Self::CashOnDelivery => write!(f, "cash_on_delivery"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paypal" => Ok(Self::PayPal),
            "stripe" => Ok(Self::Stripe),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Where an order sits in its lifecycle.
///
/// `Created -> Paid -> Shipped -> Delivered`. Shipped regresses to Paid when
/// the tracking number is removed; Delivered is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Paid,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Derive the status from the order's persisted flags.
    #[must_use]
    pub const fn derive(is_paid: bool, has_tracking: bool, is_delivered: bool) -> Self {
        match (is_paid, has_tracking, is_delivered) {
            (_, _, true) => Self::Delivered,
            (true, true, false) => Self::Shipped,
            (true, false, false) => Self::Paid,
            (false, _, false) => Self::Created,
        }
    }
}

macro_rules! text_column {
    ($name:ident) => {
        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(Into::into)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
            }
        }
    };
}

text_column!(UserRole);
text_column!(PaymentMethod);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Customer, UserRole::Admin] {
            let parsed: UserRole = role.to_string().parse().expect("roundtrip");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_payment_method_roundtrip() {
        for method in [
            PaymentMethod::PayPal,
            PaymentMethod::Stripe,
            PaymentMethod::CashOnDelivery,
        ] {
            let parsed: PaymentMethod = method.to_string().parse().expect("roundtrip");
            assert_eq!(parsed, method);
        }
    }

    #[test]
    fn test_invalid_payment_method_rejected() {
        assert!("wire_transfer".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_status_derivation() {
        assert_eq!(OrderStatus::derive(false, false, false), OrderStatus::Created);
        assert_eq!(OrderStatus::derive(true, false, false), OrderStatus::Paid);
        assert_eq!(OrderStatus::derive(true, true, false), OrderStatus::Shipped);
        assert_eq!(OrderStatus::derive(true, true, true), OrderStatus::Delivered);
        // Tracking removal regresses Shipped back to Paid
        assert_eq!(OrderStatus::derive(true, false, false), OrderStatus::Paid);
    }
}
