//! Order service: creation, status transitions, cancellation.
//!
//! # Consistency model
//!
//! `Product.stock` is the one contended resource. Every order creation runs
//! inside a single Postgres transaction in which each line item's stock is
//! reserved via an atomic conditional `UPDATE ... WHERE stock >= quantity`
//! (see [`ProductRepository::decrement_stock`]). If any reservation fails -
//! because a concurrent order won the race - the transaction rolls back and
//! every prior decrement in this cart is undone, so an order either reserves
//! its whole cart or nothing. No in-process lock is involved, which means
//! any number of API instances can run against the same database.
//!
//! Status transitions take the order row lock (`SELECT ... FOR UPDATE`)
//! before validating, so a second concurrent cancellation observes the
//! committed `cancelled` status and fails instead of restoring stock twice.
//! Cancellation restores stock in the same transaction that flips the
//! status: either both happen or neither does.
//!
//! Monetary fields are computed server-side from catalog prices read in the
//! same transaction; client-supplied totals are never trusted.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use protech_core::{
    CASH_ON_DELIVERY, OrderId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use crate::config::PricingConfig;
use crate::db::orders::NewOrder;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{NewOrderItem, Order, ShippingAddress, User};
use crate::services::auth::UserIdentity;
use crate::services::email::EmailService;

/// Errors from the order service.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed request: empty cart, non-positive quantity, missing
    /// address fields.
    #[error("{0}")]
    InvalidInput(String),

    /// The buying account does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The order does not exist.
    #[error("Order not found")]
    OrderNotFound,

    /// A cart line references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds available stock. Names the product and
    /// what is actually left.
    #[error("Insufficient stock for {product}. Only {available} left.")]
    InsufficientStock {
        /// Display name of the offending product.
        product: String,
        /// Units still available.
        available: i32,
    },

    /// The requested status change is not on the transition graph.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// The order has shipped (or is already terminal) and cannot be cancelled.
    #[error("Cannot cancel an order that is {0}")]
    NotCancellable(OrderStatus),

    /// The caller is neither the owner nor an admin.
    #[error("Not your order")]
    NotOwner,

    /// Underlying repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One cart line in an order request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderLine {
    /// The product to purchase.
    pub product_id: ProductId,
    /// Units requested. Must be positive.
    pub quantity: i32,
}

/// Client request to create an order.
///
/// Deliberately carries no prices: subtotal, shipping, tax, and total are
/// all computed server-side from the catalog.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    /// Cart lines. Must be non-empty.
    pub items: Vec<OrderLine>,
    /// Shipping address.
    pub shipping_address: ShippingAddress,
    /// Payment method label.
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    CASH_ON_DELIVERY.to_owned()
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    pricing: PricingConfig,
    notifier: Option<EmailService>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        pricing: PricingConfig,
        notifier: Option<EmailService>,
    ) -> Self {
        Self {
            pool,
            pricing,
            notifier,
        }
    }

    /// Create an order for `user_id` from the given cart.
    ///
    /// Validates the cart, atomically reserves stock for every line item,
    /// computes totals from catalog prices, persists the order with frozen
    /// line-item snapshots, and fires the confirmation email after commit.
    /// All-or-nothing: a failure at any point before commit leaves stock
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidInput`, `UserNotFound`,
    /// `ProductNotFound`, or `InsufficientStock` per spec; repository
    /// failures bubble up as `Repository`.
    pub async fn create_order(
        &self,
        user_id: UserId,
        request: OrderRequest,
    ) -> Result<Order, OrderError> {
        validate_request(&request)?;

        let user = UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // Validate and reserve in one pass. The conditional decrement is the
        // authoritative check; the preceding read only exists to produce the
        // snapshot and a friendly error.
        let mut snapshots = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = ProductRepository::get_on(&mut *tx, line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            if product.stock < line.quantity {
                return Err(OrderError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                });
            }

            let reserved =
                ProductRepository::decrement_stock(&mut *tx, line.product_id, line.quantity)
                    .await?;
            if !reserved {
                // A concurrent order raced us between the read and the
                // decrement. Re-read for an accurate shortfall message;
                // dropping the transaction reverts our earlier decrements.
                let available = ProductRepository::get_on(&mut *tx, line.product_id)
                    .await?
                    .map_or(0, |p| p.stock);
                return Err(OrderError::InsufficientStock {
                    product: product.name,
                    available,
                });
            }

            snapshots.push(NewOrderItem {
                product_id: line.product_id,
                name: product.name,
                price: product.price,
                quantity: line.quantity,
                image: product.images.first().cloned(),
            });
        }

        let subtotal = cart_subtotal(&snapshots);
        let shipping = self.pricing.shipping(subtotal);
        let tax = self.pricing.tax(subtotal);
        let total = subtotal + shipping + tax;

        let payment_status = PaymentStatus::initial_for_method(&request.payment_method);
        let paid_at = (payment_status == PaymentStatus::Paid).then(Utc::now);

        let new_order = NewOrder {
            order_number: generate_order_number(),
            user_id,
            shipping_address: request.shipping_address,
            payment_method: request.payment_method,
            subtotal,
            shipping,
            tax,
            total,
            payment_status,
            paid_at,
            items: snapshots,
        };

        let order = OrderRepository::insert(&mut tx, &new_order).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        self.notify_created(&order, &user);

        Ok(order)
    }

    /// Transition an order to a new fulfillment status.
    ///
    /// Validation happens under the order row lock. Transitioning into
    /// `Delivered` stamps `delivered_at` and settles a pending
    /// cash-on-delivery payment; transitioning into `Cancelled` restores
    /// stock in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` or `InvalidTransition`.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let order = OrderRepository::get_for_update(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        match new_status {
            OrderStatus::Cancelled => {
                restore_stock(&mut tx, &order).await?;
                OrderRepository::apply_status(&mut *tx, order_id, new_status, None, None, None)
                    .await?;
            }
            OrderStatus::Delivered => {
                let now = Utc::now();
                // Cash on delivery settles at the door.
                let settle = (order.payment_status == PaymentStatus::Pending)
                    .then_some(PaymentStatus::Paid);
                let paid_at = settle.is_some().then_some(now);
                OrderRepository::apply_status(
                    &mut *tx,
                    order_id,
                    new_status,
                    settle,
                    paid_at,
                    Some(now),
                )
                .await?;
            }
            _ => {
                OrderRepository::apply_status(&mut *tx, order_id, new_status, None, None, None)
                    .await?;
            }
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        OrderRepository::new(self.pool)
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// Cancel an order on behalf of `requested_by`.
    ///
    /// Only the owner or an admin may cancel, and only while the order is
    /// still `Processing` or `Confirmed`. Stock is restored exactly once:
    /// the row lock makes a second concurrent cancel observe the committed
    /// `cancelled` status and fail with `NotCancellable`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound`, `NotOwner`, or `NotCancellable`.
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        requested_by: UserIdentity,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let order = OrderRepository::get_for_update(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        if order.user_id != requested_by.user_id && !requested_by.role.is_admin() {
            return Err(OrderError::NotOwner);
        }

        if !order.status.is_cancellable() {
            return Err(OrderError::NotCancellable(order.status));
        }

        restore_stock(&mut tx, &order).await?;
        OrderRepository::apply_status(&mut *tx, order_id, OrderStatus::Cancelled, None, None, None)
            .await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        OrderRepository::new(self.pool)
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// Hand the confirmation email to the notifier, fire-and-forget.
    ///
    /// Failure is logged and dropped: the order has already committed and
    /// its success does not depend on the email.
    fn notify_created(&self, order: &Order, user: &User) {
        let Some(mailer) = self.notifier.clone() else {
            tracing::debug!(order_number = %order.order_number, "No notifier configured, skipping confirmation email");
            return;
        };

        let order = order.clone();
        let user = user.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_order_confirmation(&order, &user).await {
                tracing::warn!(
                    order_number = %order.order_number,
                    error = %e,
                    "Failed to send order confirmation email"
                );
            } else {
                tracing::info!(
                    order_number = %order.order_number,
                    to = %user.email,
                    "Order confirmation email sent"
                );
            }
        });
    }
}

/// Restore stock for every line item that still references a product.
///
/// Runs on the cancellation transaction, before the status flip, so a
/// partial failure aborts the whole cancellation.
async fn restore_stock(tx: &mut PgConnection, order: &Order) -> Result<(), OrderError> {
    for item in &order.items {
        if let Some(product_id) = item.product_id {
            ProductRepository::increment_stock(&mut *tx, product_id, item.quantity).await?;
        }
    }
    Ok(())
}

/// Validate an order request before touching the database.
fn validate_request(request: &OrderRequest) -> Result<(), OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::InvalidInput("No order items".to_owned()));
    }

    if request.items.iter().any(|line| line.quantity <= 0) {
        return Err(OrderError::InvalidInput(
            "Item quantity must be positive".to_owned(),
        ));
    }

    let address = &request.shipping_address;
    let required = [
        ("full_name", &address.full_name),
        ("phone", &address.phone),
        ("email", &address.email),
        ("address", &address.address),
        ("city", &address.city),
        ("country", &address.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(OrderError::InvalidInput(format!(
                "Missing required address field: {field}"
            )));
        }
    }

    Ok(())
}

/// Subtotal over line-item snapshots: sum of unit price times quantity.
fn cart_subtotal(items: &[NewOrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

/// Generate a human-readable order number.
///
/// Millisecond timestamp plus a random 4-digit suffix; the database's
/// unique constraint backstops the residual collision chance.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("ORD-{millis}-{suffix:04}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Jane Doe".to_owned(),
            phone: "+1 555 0100".to_owned(),
            email: "jane@example.com".to_owned(),
            address: "1 Main St".to_owned(),
            city: "Springfield".to_owned(),
            postal_code: Some("12345".to_owned()),
            country: "USA".to_owned(),
        }
    }

    fn request(items: Vec<OrderLine>) -> OrderRequest {
        OrderRequest {
            items,
            shipping_address: address(),
            payment_method: CASH_ON_DELIVERY.to_owned(),
        }
    }

    fn line(product_id: i32, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    fn snapshot(price: Decimal, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id: ProductId::new(1),
            name: "Widget".to_owned(),
            price,
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_validate_rejects_empty_cart() {
        let err = validate_request(&request(vec![])).unwrap_err();
        assert!(matches!(err, OrderError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        assert!(validate_request(&request(vec![line(1, 0)])).is_err());
        assert!(validate_request(&request(vec![line(1, -3)])).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_address_field() {
        let mut req = request(vec![line(1, 1)]);
        req.shipping_address.city = "  ".to_owned();
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_validate_allows_missing_postal_code() {
        let mut req = request(vec![line(1, 1)]);
        req.shipping_address.postal_code = None;
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        assert!(validate_request(&request(vec![line(1, 2), line(2, 1)])).is_ok());
    }

    #[test]
    fn test_cart_subtotal() {
        let items = vec![
            snapshot(Decimal::new(1099, 2), 3), // 32.97
            snapshot(Decimal::new(500, 2), 2),  // 10.00
        ];
        assert_eq!(cart_subtotal(&items), Decimal::new(4297, 2));
    }

    #[test]
    fn test_cart_subtotal_empty_is_zero() {
        assert_eq!(cart_subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].parse::<u16>().is_ok());
    }

    #[test]
    fn test_default_payment_method_is_cod() {
        let req: OrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"product_id": 1, "quantity": 2}],
            "shipping_address": {
                "full_name": "Jane Doe",
                "phone": "+1 555 0100",
                "email": "jane@example.com",
                "address": "1 Main St",
                "city": "Springfield",
                "postal_code": null,
                "country": "USA"
            }
        }))
        .unwrap();
        assert_eq!(req.payment_method, CASH_ON_DELIVERY);
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = OrderError::InsufficientStock {
            product: "MacBook Air M3".to_owned(),
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for MacBook Air M3. Only 1 left."
        );
    }
}
