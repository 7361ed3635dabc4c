//! Normalized payment provider confirmation.

use serde::{Deserialize, Serialize};

use crate::types::money::Money;

/// Normalized record of a payment provider's confirmation.
///
/// Both PayPal captures and Stripe payment intents collapse into this shape
/// before being stored on the order as JSONB. While a provider order is still
/// pending, `status` and `payer_email` are empty and `amount` is zero - only
/// `id` carries the provider reference to verify against at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentReceipt {
    /// Provider-side transaction/order id.
    pub id: String,
    /// Provider-side status (e.g. `COMPLETED`, `succeeded`).
    pub status: String,
    /// Payer's email as reported by the provider.
    pub payer_email: String,
    /// Amount actually captured.
    pub amount: Money,
}

impl PaymentReceipt {
    /// A pending receipt holding only the provider reference.
    #[must_use]
    pub fn pending(provider_id: impl Into<String>) -> Self {
        Self {
            id: provider_id.into(),
            status: String::new(),
            payer_email: String::new(),
            amount: Money::ZERO,
        }
    }

    /// Whether this receipt is still awaiting capture.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status.is_empty()
    }
}

// SQLx support (with postgres feature): stored as JSONB.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PaymentReceipt {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <sqlx::types::Json<Self> as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <sqlx::types::Json<Self> as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PaymentReceipt {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let json = <sqlx::types::Json<Self> as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(json.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PaymentReceipt {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <sqlx::types::Json<&Self> as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(
            &sqlx::types::Json(self),
            buf,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_receipt() {
        let receipt = PaymentReceipt::pending("PAYPAL-ORDER-1");
        assert!(receipt.is_pending());
        assert_eq!(receipt.id, "PAYPAL-ORDER-1");
        assert!(receipt.amount.is_zero());
    }

    #[test]
    fn test_captured_receipt_is_not_pending() {
        let receipt = PaymentReceipt {
            id: "PAYPAL-ORDER-1".to_owned(),
            status: "COMPLETED".to_owned(),
            payer_email: "buyer@example.com".to_owned(),
            amount: Money::from_cents(12050),
        };
        assert!(!receipt.is_pending());
    }

    #[test]
    fn test_serde_roundtrip() {
        let receipt = PaymentReceipt {
            id: "pi_123".to_owned(),
            status: "succeeded".to_owned(),
            payer_email: "buyer@example.com".to_owned(),
            amount: Money::from_cents(9900),
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let parsed: PaymentReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, receipt);
    }
}
