//! Transactional email: order-confirmation notifier.
//!
//! SMTP delivery via lettre with Askama HTML templates. Sending is
//! best-effort and always happens off the request path; a delivery failure
//! never fails the order that triggered it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Order, User};

/// One rendered line item. Money is pre-formatted so the templates stay
/// plain string interpolation.
struct LineItemView {
    name: String,
    quantity: i32,
    unit_price: String,
    line_total: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    items: &'a [LineItemView],
    subtotal: String,
    shipping: String,
    tax: String,
    total: String,
    payment_method: &'a str,
    ship_to: String,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    items: &'a [LineItemView],
    subtotal: String,
    shipping: String,
    tax: String,
    total: String,
    payment_method: &'a str,
    ship_to: String,
}

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

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
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
        })
    }

    /// Send the order confirmation email for a freshly placed order.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to render.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        user: &User,
    ) -> Result<(), EmailError> {
        let items: Vec<LineItemView> = order
            .items
            .iter()
            .map(|item| LineItemView {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: money(item.price),
                line_total: money(item.price * Decimal::from(item.quantity)),
            })
            .collect();

        let address = &order.shipping_address;
        let ship_to = match &address.postal_code {
            Some(postal) => format!(
                "{}, {}, {} {}, {}",
                address.full_name, address.address, address.city, postal, address.country
            ),
            None => format!(
                "{}, {}, {}, {}",
                address.full_name, address.address, address.city, address.country
            ),
        };

        let html = OrderConfirmationHtml {
            customer_name: &user.name,
            order_number: &order.order_number,
            items: &items,
            subtotal: money(order.subtotal),
            shipping: money(order.shipping),
            tax: money(order.tax),
            total: money(order.total),
            payment_method: &order.payment_method,
            ship_to: ship_to.clone(),
        }
        .render()?;
        let text = OrderConfirmationText {
            customer_name: &user.name,
            order_number: &order.order_number,
            items: &items,
            subtotal: money(order.subtotal),
            shipping: money(order.shipping),
            tax: money(order.tax),
            total: money(order.total),
            payment_method: &order.payment_method,
            ship_to,
        }
        .render()?;

        let subject = format!("Order Confirmed - {}", order.order_number);
        self.send_multipart_email(user.email.as_str(), &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Format a monetary amount with a currency sign and two decimal places.
fn money(amount: Decimal) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_keeps_two_decimal_places() {
        assert_eq!(money(Decimal::new(1099, 2)), "$10.99");
        assert_eq!(money(Decimal::new(123455, 3)), "$123.46");
    }

    #[test]
    fn test_money_pads_whole_amounts() {
        assert_eq!(money(Decimal::from(10)), "$10.00");
        assert_eq!(money(Decimal::ZERO), "$0.00");
    }
}
