//! Domain types served to API clients.
//!
//! These are validated domain objects, separate from database row types.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrderItem, Order, OrderItem, ShippingAddress};
pub use product::{Product, ProductDraft};
pub use user::User;
