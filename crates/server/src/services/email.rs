//! Transactional email via SMTP (lettre).
//!
//! Plain-text bodies only: receipt, shipment, password-reset, and
//! password-changed notifications.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use oxcart_core::Email;

use crate::config::EmailConfig;
use crate::models::OrderDetail;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            base_url: base_url.to_owned(),
        })
    }

    /// Send the purchase receipt after an order is marked paid.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_purchase_receipt(
        &self,
        to: &Email,
        detail: &OrderDetail,
    ) -> Result<(), EmailError> {
        let subject = format!("Your order {} has been received", detail.order.id);
        self.send_text_email(to, &subject, &receipt_body(detail, &self.base_url))
            .await
    }

    /// Send the shipment notification when a tracking number lands.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_order_shipped(
        &self,
        to: &Email,
        detail: &OrderDetail,
    ) -> Result<(), EmailError> {
        self.send_text_email(
            to,
            "Your order has been shipped",
            &shipped_body(detail, &self.base_url),
        )
        .await
    }

    /// Send the password-reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_reset_password(&self, to: &Email, reset_url: &str) -> Result<(), EmailError> {
        let body = format!(
            "Hello,\n\n\
             A password reset was requested for your Oxcart account.\n\
             Follow this link to choose a new password:\n\n{reset_url}\n\n\
             If you didn't request this, you can ignore this email.\n"
        );
        self.send_text_email(to, "Reset your Oxcart password", &body)
            .await
    }

    /// Send the password-changed alert.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_password_changed(&self, to: &Email, name: &str) -> Result<(), EmailError> {
        let body = format!(
            "Hello {name},\n\n\
             The password on your Oxcart account was just changed.\n\
             If this wasn't you, reset your password immediately.\n"
        );
        self.send_text_email(to, "Your Oxcart password was changed", &body)
            .await
    }

    /// Send a plain-text email.
    async fn send_text_email(
        &self,
        to: &Email,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Body of the purchase receipt.
fn receipt_body(detail: &OrderDetail, base_url: &str) -> String {
    let mut body = String::from("Thanks for your order!\n\nItems:\n");
    for item in &detail.items {
        body.push_str(&format!(
            "  {} x{} - {}\n",
            item.name,
            item.qty,
            item.price * item.qty
        ));
    }
    body.push_str(&format!(
        "\nItems: {}\nShipping: {}\nTax: {}\nTotal: {}\n\nTrack your order: {base_url}/order/{}\n",
        detail.order.items_price,
        detail.order.shipping_price,
        detail.order.tax_price,
        detail.order.total_price,
        detail.order.id,
    ));
    body
}

/// Body of the shipment notification.
fn shipped_body(detail: &OrderDetail, base_url: &str) -> String {
    let tracking = detail.order.tracking_number.as_deref().unwrap_or("(pending)");
    format!(
        "Good news - your order is on its way!\n\n\
         Tracking number: {tracking}\n\n\
         View your order: {base_url}/order/{}\n",
        detail.order.id,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use oxcart_core::{Money, OrderId, PaymentMethod, ProductId, ShippingAddress};

    use super::*;
    use crate::models::{Order, OrderItem, Purchaser};

    fn detail() -> OrderDetail {
        let order = Order {
            id: OrderId::generate(),
            user_id: None,
            guest_id: None,
            shipping_address: ShippingAddress {
                full_name: "Ada Lovelace".to_owned(),
                street_address: "12 Analytical Way".to_owned(),
                city: "London".to_owned(),
                postal_code: "EC1A".to_owned(),
                country: "United Kingdom".to_owned(),
                guest_email: None,
                lat: None,
                lng: None,
            },
            payment_method: PaymentMethod::PayPal,
            items_price: Money::from_cents(39_98),
            shipping_price: Money::from_cents(10_00),
            tax_price: Money::from_cents(6_00),
            total_price: Money::from_cents(55_98),
            payment_result: None,
            is_paid: true,
            paid_at: Some(Utc::now()),
            is_delivered: false,
            delivered_at: None,
            tracking_number: Some("ZX123456789".to_owned()),
            created_at: Utc::now(),
        };
        let items = vec![OrderItem {
            order_id: order.id,
            product_id: ProductId::generate(),
            qty: 2,
            price: Money::from_cents(19_99),
            name: "Test Shirt".to_owned(),
            slug: "test-shirt".to_owned(),
            image: "/images/test.jpg".to_owned(),
            size: None,
        }];
        let purchaser = Purchaser {
            name: Some("Ada Lovelace".to_owned()),
            email: None,
        };
        OrderDetail::new(order, items, purchaser)
    }

    #[test]
    fn test_receipt_body_lists_items_and_totals() {
        let detail = detail();
        let body = receipt_body(&detail, "https://shop.example");
        assert!(body.contains("Test Shirt x2 - $39.98"));
        assert!(body.contains("Total: $55.98"));
        assert!(body.contains(&format!("https://shop.example/order/{}", detail.order.id)));
    }

    #[test]
    fn test_shipped_body_includes_tracking() {
        let body = shipped_body(&detail(), "https://shop.example");
        assert!(body.contains("ZX123456789"));
    }
}
