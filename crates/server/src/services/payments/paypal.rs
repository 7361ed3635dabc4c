//! PayPal Checkout Orders API client.
//!
//! Implements order creation and capture against the v2 Checkout API with
//! client-credentials OAuth. Captures are verified against the provider order
//! id we stored at create time before any order is marked paid - the approval
//! round-trips through the buyer's browser and can't be trusted on its own.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use oxcart_core::{Money, PaymentReceipt};

use super::PaymentError;
use crate::config::PayPalConfig;

/// Status a capture must report before an order is marked paid.
const CAPTURE_COMPLETED: &str = "COMPLETED";

/// PayPal API client.
#[derive(Clone)]
pub struct PayPalClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    api_base: String,
}

impl PayPalClient {
    /// Create a new PayPal client.
    #[must_use]
    pub fn new(config: &PayPalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// Fetch a client-credentials access token.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let url = format!("{}/v1/oauth2/token", self.api_base);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Create a provider order sized from the internal order's total.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` for provider rejections or
    /// `PaymentError::Http`/`PaymentError::Parse` for transport problems.
    pub async fn create_order(&self, total: Money) -> Result<ProviderOrder, PaymentError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/checkout/orders", self.api_base);

        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": "USD",
                    "value": total.amount().to_string(),
                }
            }]
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Capture an approved provider order.
    ///
    /// The caller must run the result through [`verify_capture`] before
    /// trusting it.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` for provider rejections or
    /// `PaymentError::Http`/`PaymentError::Parse` for transport problems.
    pub async fn capture_order(
        &self,
        provider_order_id: &str,
    ) -> Result<CaptureResponse, PaymentError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v2/checkout/orders/{provider_order_id}/capture",
            self.api_base
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Check a capture against the pending provider order id and normalize it.
///
/// The client controls which provider order id it sends up for capture, so
/// the capture is only trusted when (a) its id equals the one stored on the
/// order at create time and (b) PayPal reports the capture `COMPLETED`.
///
/// # Errors
///
/// Returns `PaymentError::Verification` naming the failed check.
pub fn verify_capture(
    capture: &CaptureResponse,
    pending_id: &str,
) -> Result<PaymentReceipt, PaymentError> {
    if capture.id != pending_id {
        return Err(PaymentError::Verification(format!(
            "provider order id mismatch: got {}, expected {pending_id}",
            capture.id
        )));
    }

    if capture.status != CAPTURE_COMPLETED {
        return Err(PaymentError::Verification(format!(
            "capture status is {}, expected {CAPTURE_COMPLETED}",
            capture.status
        )));
    }

    let amount = capture
        .purchase_units
        .first()
        .and_then(|unit| unit.payments.as_ref())
        .and_then(|payments| payments.captures.first())
        .map(|capture| capture.amount.value.as_str())
        .ok_or_else(|| PaymentError::Verification("capture carries no amount".to_owned()))?;

    let amount: Decimal = amount
        .parse()
        .map_err(|_| PaymentError::Verification(format!("unparseable amount: {amount}")))?;

    Ok(PaymentReceipt {
        id: capture.id.clone(),
        status: capture.status.clone(),
        payer_email: capture
            .payer
            .as_ref()
            .and_then(|payer| payer.email_address.clone())
            .unwrap_or_default(),
        amount: Money::from_decimal(amount),
    })
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A provider order as returned by order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub status: String,
}

/// Response from capturing a provider order.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureResponse {
    pub id: String,
    pub status: String,
    pub payer: Option<Payer>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

/// The paying account.
#[derive(Debug, Clone, Deserialize)]
pub struct Payer {
    pub email_address: Option<String>,
}

/// One purchase unit of a capture.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    pub payments: Option<Payments>,
}

/// Payments recorded against a purchase unit.
#[derive(Debug, Clone, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

/// A single capture.
#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    pub amount: Amount,
}

/// A provider money amount.
#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    pub currency_code: String,
    pub value: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn capture(id: &str, status: &str, value: Option<&str>) -> CaptureResponse {
        CaptureResponse {
            id: id.to_owned(),
            status: status.to_owned(),
            payer: Some(Payer {
                email_address: Some("buyer@example.com".to_owned()),
            }),
            purchase_units: value
                .map(|value| {
                    vec![PurchaseUnit {
                        payments: Some(Payments {
                            captures: vec![Capture {
                                amount: Amount {
                                    currency_code: "USD".to_owned(),
                                    value: value.to_owned(),
                                },
                            }],
                        }),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_verify_capture_success() {
        let receipt =
            verify_capture(&capture("PP-1", "COMPLETED", Some("55.98")), "PP-1").unwrap();
        assert_eq!(receipt.id, "PP-1");
        assert_eq!(receipt.status, "COMPLETED");
        assert_eq!(receipt.payer_email, "buyer@example.com");
        assert_eq!(receipt.amount, Money::from_cents(55_98));
    }

    #[test]
    fn test_verify_capture_rejects_id_mismatch() {
        let err = verify_capture(&capture("PP-OTHER", "COMPLETED", Some("55.98")), "PP-1")
            .unwrap_err();
        assert!(matches!(err, PaymentError::Verification(_)));
    }

    #[test]
    fn test_verify_capture_rejects_incomplete_status() {
        let err =
            verify_capture(&capture("PP-1", "PENDING", Some("55.98")), "PP-1").unwrap_err();
        assert!(matches!(err, PaymentError::Verification(_)));
    }

    #[test]
    fn test_verify_capture_rejects_missing_amount() {
        let err = verify_capture(&capture("PP-1", "COMPLETED", None), "PP-1").unwrap_err();
        assert!(matches!(err, PaymentError::Verification(_)));
    }

    #[test]
    fn test_verify_capture_rejects_unparseable_amount() {
        let err =
            verify_capture(&capture("PP-1", "COMPLETED", Some("lots")), "PP-1").unwrap_err();
        assert!(matches!(err, PaymentError::Verification(_)));
    }
}
