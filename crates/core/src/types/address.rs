//! Shipping address captured at checkout.

use serde::{Deserialize, Serialize};

use crate::types::email::Email;

/// Errors returned by [`ShippingAddress::validate`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum AddressError {
    /// A required field is missing or too short.
    #[error("{field} must be at least {min} characters")]
    TooShort {
        /// Human-readable field name.
        field: &'static str,
        /// Minimum required length.
        min: usize,
    },
    /// Guest checkout requires a contact email.
    #[error("guest email is required")]
    MissingGuestEmail,
}

/// A shipping address.
///
/// Stored as JSONB on users, guests, and orders. Orders keep their own copy
/// taken at place-order time, so later address edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    /// Contact email for guest checkout; absent for signed-in users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// Minimum length for the free-text address fields.
const MIN_FIELD_LENGTH: usize = 3;

impl ShippingAddress {
    /// Validate field lengths.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::TooShort`] naming the first offending field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let fields = [
            ("full name", &self.full_name),
            ("street address", &self.street_address),
            ("city", &self.city),
            ("postal code", &self.postal_code),
            ("country", &self.country),
        ];

        for (field, value) in fields {
            if value.trim().len() < MIN_FIELD_LENGTH {
                return Err(AddressError::TooShort {
                    field,
                    min: MIN_FIELD_LENGTH,
                });
            }
        }

        Ok(())
    }

    /// Validate for guest checkout, which additionally requires an email.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingGuestEmail`] when no guest email is set,
    /// or [`AddressError::TooShort`] for any short field.
    pub fn validate_for_guest(&self) -> Result<&Email, AddressError> {
        self.validate()?;
        self.guest_email
            .as_ref()
            .ok_or(AddressError::MissingGuestEmail)
    }
}

// SQLx support (with postgres feature): stored as JSONB.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShippingAddress {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <sqlx::types::Json<Self> as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <sqlx::types::Json<Self> as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShippingAddress {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let json = <sqlx::types::Json<Self> as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(json.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShippingAddress {
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

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_owned(),
            street_address: "12 Analytical Way".to_owned(),
            city: "London".to_owned(),
            postal_code: "EC1A".to_owned(),
            country: "United Kingdom".to_owned(),
            guest_email: None,
            lat: None,
            lng: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(address().validate().is_ok());
    }

    #[test]
    fn test_validate_short_field() {
        let mut addr = address();
        addr.city = "X".to_owned();
        assert!(matches!(
            addr.validate(),
            Err(AddressError::TooShort { field: "city", .. })
        ));
    }

    #[test]
    fn test_validate_for_guest_requires_email() {
        let addr = address();
        assert!(matches!(
            addr.validate_for_guest(),
            Err(AddressError::MissingGuestEmail)
        ));

        let mut addr = address();
        addr.guest_email = Some(Email::parse("guest@example.com").unwrap());
        assert_eq!(
            addr.validate_for_guest().unwrap().as_str(),
            "guest@example.com"
        );
    }

    #[test]
    fn test_serde_omits_absent_optionals() {
        let json = serde_json::to_string(&address()).unwrap();
        assert!(!json.contains("guest_email"));
        assert!(!json.contains("lat"));
    }
}
