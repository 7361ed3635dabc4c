//! Stripe Payment Intents API client and webhook verification.
//!
//! The intent is created server-side from the order total; the client secret
//! goes to the front end for confirmation. Server-side truth arrives through
//! the signed `payment_intent.succeeded` webhook, which reconciles intents
//! the client abandoned after paying.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use oxcart_core::{Money, OrderId, PaymentReceipt};

use super::PaymentError;
use crate::config::StripeConfig;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Accepted clock skew between Stripe's signature timestamp and ours.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: SecretString,
    webhook_secret: SecretString,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Create a payment intent sized from the order total, tagged with the
    /// order id so the webhook can find its way back.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for unrepresentable totals,
    /// `PaymentError::Api` for provider rejections, or
    /// `PaymentError::Http`/`PaymentError::Parse` for transport problems.
    pub async fn create_payment_intent(
        &self,
        order_id: OrderId,
        total: Money,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount_cents = total.to_cents().ok_or(PaymentError::InvalidAmount)?;
        if amount_cents <= 0 {
            return Err(PaymentError::InvalidAmount);
        }

        let url = format!("{API_BASE}/payment_intents");
        let order_id = order_id.to_string();
        let amount = amount_cents.to_string();
        let params: &[(&str, &str)] = &[
            ("amount", &amount),
            ("currency", "usd"),
            ("metadata[order_id]", &order_id),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(params)
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

    /// Verify a webhook delivery and parse it into an event.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Signature` for a bad or stale signature, or
    /// `PaymentError::Parse` for an unreadable payload.
    pub fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<WebhookEvent, PaymentError> {
        verify_signature(
            payload,
            signature_header,
            self.webhook_secret.expose_secret(),
            now_unix,
            SIGNATURE_TOLERANCE_SECS,
        )?;

        serde_json::from_slice(payload).map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Verify a `Stripe-Signature` header against the payload.
///
/// The header carries `t=<unix>,v1=<hex mac>[,v1=...]`; the MAC is
/// HMAC-SHA256 over `"{t}.{payload}"`. Deliveries older (or newer) than
/// `tolerance_secs` are rejected even with a valid MAC to blunt replay.
///
/// # Errors
///
/// Returns `PaymentError::Signature` describing the failed check.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    candidates.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::Signature("missing timestamp".to_owned()))?;

    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(PaymentError::Signature(
            "timestamp outside tolerance".to_owned(),
        ));
    }

    if candidates.is_empty() {
        return Err(PaymentError::Signature("missing v1 signature".to_owned()));
    }

    for candidate in candidates {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentError::Signature(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        // verify_slice is constant-time
        if mac.verify_slice(&candidate).is_ok() {
            return Ok(());
        }
    }

    Err(PaymentError::Signature("no matching signature".to_owned()))
}

/// A created payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the front end to confirm the payment.
    pub client_secret: String,
    pub status: String,
}

/// A webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

/// The event payload wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: IntentObject,
}

/// The payment intent carried by the event.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentObject {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount_received: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
}

impl WebhookEvent {
    /// Whether this event confirms a successful payment.
    #[must_use]
    pub fn is_payment_succeeded(&self) -> bool {
        self.event_type == "payment_intent.succeeded"
    }

    /// The internal order id stored in the intent's metadata.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Parse` when the metadata lacks a usable id.
    pub fn order_id(&self) -> Result<OrderId, PaymentError> {
        self.data
            .object
            .metadata
            .get("order_id")
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| PaymentError::Parse("event carries no order_id metadata".to_owned()))
    }

    /// Normalize the intent into a payment receipt.
    #[must_use]
    pub fn receipt(&self) -> PaymentReceipt {
        let object = &self.data.object;
        PaymentReceipt {
            id: object.id.clone(),
            status: object.status.clone(),
            payer_email: object.receipt_email.clone().unwrap_or_default(),
            amount: Money::from_cents(object.amount_received),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_4242424242";

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_signature_accepts_valid() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign(payload, 1_700_000_000, SECRET);
        assert!(verify_signature(payload, &header, SECRET, 1_700_000_010, 300).is_ok());
    }

    #[test]
    fn test_verify_signature_rejects_tampered_payload() {
        let header = sign(b"original", 1_700_000_000, SECRET);
        let err = verify_signature(b"tampered", &header, SECRET, 1_700_000_010, 300).unwrap_err();
        assert!(matches!(err, PaymentError::Signature(_)));
    }

    #[test]
    fn test_verify_signature_rejects_wrong_secret() {
        let payload = b"payload";
        let header = sign(payload, 1_700_000_000, "whsec_other_9999999999");
        assert!(verify_signature(payload, &header, SECRET, 1_700_000_010, 300).is_err());
    }

    #[test]
    fn test_verify_signature_rejects_stale_timestamp() {
        let payload = b"payload";
        let header = sign(payload, 1_700_000_000, SECRET);
        // Ten minutes later, outside the 5-minute window
        let err = verify_signature(payload, &header, SECRET, 1_700_000_600, 300).unwrap_err();
        assert!(matches!(err, PaymentError::Signature(_)));
    }

    #[test]
    fn test_verify_signature_rejects_malformed_header() {
        let err =
            verify_signature(b"payload", "not-a-header", SECRET, 1_700_000_000, 300).unwrap_err();
        assert!(matches!(err, PaymentError::Signature(_)));
    }

    #[test]
    fn test_webhook_event_parsing() {
        let order_id = OrderId::generate();
        let payload = format!(
            r#"{{
                "type": "payment_intent.succeeded",
                "data": {{
                    "object": {{
                        "id": "pi_123",
                        "status": "succeeded",
                        "amount_received": 5598,
                        "receipt_email": "buyer@example.com",
                        "metadata": {{"order_id": "{order_id}"}}
                    }}
                }}
            }}"#
        );

        let event: WebhookEvent = serde_json::from_str(&payload).unwrap();
        assert!(event.is_payment_succeeded());
        assert_eq!(event.order_id().unwrap(), order_id);

        let receipt = event.receipt();
        assert_eq!(receipt.id, "pi_123");
        assert_eq!(receipt.amount, Money::from_cents(5598));
        assert_eq!(receipt.payer_email, "buyer@example.com");
    }
}
