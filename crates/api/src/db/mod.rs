//! Database access for the ProTech API.
//!
//! # Tables
//!
//! - `users` - accounts (customers and admins)
//! - `products` - catalog, including the contended `stock` column
//! - `orders` / `order_items` - immutable order records with line-item snapshots
//! - `wishlist_items` - per-user product sets
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and are run explicitly via:
//! ```bash
//! cargo run -p protech-cli -- migrate
//! ```
//! They are never run automatically on startup.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod orders;
pub mod products;
pub mod users;
pub mod wishlists;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlists::WishlistRepository;

/// Errors surfaced by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
