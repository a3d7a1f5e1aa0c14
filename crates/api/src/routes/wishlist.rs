//! Wishlist route handlers. All require auth; the wishlist is always the
//! token user's own.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;

use protech_core::ProductId;

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::state::AppState;

/// List the products on the user's wishlist, most recently added first.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = WishlistRepository::new(state.pool())
        .list_for_user(identity.user_id)
        .await?;
    Ok(Json(products))
}

/// Add a product to the wishlist. Adding twice is a no-op.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn add(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let added = WishlistRepository::new(state.pool())
        .add(identity.user_id, product_id)
        .await?;

    if added {
        Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "Added to wishlist" })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Already in wishlist" })),
        ))
    }
}

/// Remove a product from the wishlist. Removing an absent product is a
/// no-op.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn remove(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .remove(identity.user_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
