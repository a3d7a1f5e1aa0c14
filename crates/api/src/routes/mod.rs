//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (pings the database)
//!
//! # Auth
//! POST   /api/auth/register             - Register a customer account
//! POST   /api/auth/login                - Login with email and password
//! GET    /api/auth/me                   - Current account (requires auth)
//!
//! # Catalog
//! GET    /api/products                  - Product listing, newest first
//! GET    /api/products/{id}             - Product detail
//! POST   /api/products                  - Create product (admin)
//! PUT    /api/products/{id}             - Update product (admin)
//! DELETE /api/products/{id}             - Delete product (admin)
//!
//! # Orders
//! POST   /api/orders                    - Place an order (requires auth)
//! GET    /api/orders/{id}               - Order detail (owner or admin)
//! GET    /api/orders/user/{user_id}     - Order history (owner or admin)
//! PUT    /api/orders/{id}/cancel        - Cancel an order (owner or admin)
//!
//! # Wishlist (requires auth)
//! GET    /api/wishlist                  - List wishlist products
//! POST   /api/wishlist/{product_id}     - Add a product
//! DELETE /api/wishlist/{product_id}     - Remove a product
//!
//! # Admin (requires admin)
//! GET    /api/admin/users               - All accounts
//! GET    /api/admin/orders              - All orders
//! PUT    /api/admin/orders/{id}/status  - Advance an order's status
//! DELETE /api/admin/orders/{id}         - Purge an order
//! GET    /api/admin/stats               - Dashboard statistics
//! ```

pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/user/{user_id}", get(orders::list_for_user))
        .route("/{id}/cancel", put(orders::cancel))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::list))
        .route(
            "/{product_id}",
            post(wishlist::add).delete(wishlist::remove),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route("/orders/{id}", delete(admin::purge_order))
        .route("/stats", get(admin::stats))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/admin", admin_routes())
}

/// Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: verifies the database answers.
async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => Ok(Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
