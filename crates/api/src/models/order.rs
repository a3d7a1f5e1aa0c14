//! Order domain types.
//!
//! An order is an immutable financial record: monetary fields and line-item
//! snapshots are frozen at creation. Only the two status fields and their
//! timestamps change afterwards, and only through the order service's
//! validated transitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use protech_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

/// A customer order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Human-readable unique order number (e.g. `ORD-1724480000000-0042`).
    pub order_number: String,
    /// Owning account.
    pub user_id: UserId,
    /// Line-item snapshots captured at creation.
    pub items: Vec<OrderItem>,
    /// Shipping address captured at checkout.
    pub shipping_address: ShippingAddress,
    /// Payment method label.
    pub payment_method: String,
    /// Sum of unit price times quantity over all items.
    pub subtotal: Decimal,
    /// Shipping cost per the configured rule.
    pub shipping: Decimal,
    /// Tax per the configured rate.
    pub tax: Decimal,
    /// `subtotal + shipping + tax`, frozen at creation.
    pub total: Decimal,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Payment settlement status.
    pub payment_status: PaymentStatus,
    /// When payment settled, if it has.
    pub paid_at: Option<DateTime<Utc>>,
    /// When the order was delivered, if it has been.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// A line-item snapshot.
///
/// Name, price, and image are copies taken from the product at purchase
/// time. Later catalog edits never change them. The product reference is
/// kept only for stock restoration and may be gone if the product was
/// deleted from the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// The referenced product, if it still exists.
    pub product_id: Option<ProductId>,
    /// Product name at time of purchase.
    pub name: String,
    /// Unit price at time of purchase.
    pub price: Decimal,
    /// Units ordered. Positive.
    pub quantity: i32,
    /// Primary product image at time of purchase.
    pub image: Option<String>,
}

/// A line-item snapshot ready to be persisted with a new order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// The purchased product.
    pub product_id: ProductId,
    /// Product name at time of purchase.
    pub name: String,
    /// Unit price at time of purchase.
    pub price: Decimal,
    /// Units ordered.
    pub quantity: i32,
    /// Primary product image at time of purchase.
    pub image: Option<String>,
}

/// Structured shipping address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name.
    pub full_name: String,
    /// Contact phone number.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code, where applicable.
    pub postal_code: Option<String>,
    /// Country.
    pub country: String,
}
