//! Order route handlers.
//!
//! The buyer is always the authenticated token user; the request body never
//! names an account. Reads are restricted to the owner or an admin.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use protech_core::{OrderId, UserId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::auth::UserIdentity;
use crate::services::orders::{OrderRequest, OrderService};
use crate::state::AppState;

fn order_service(state: &AppState) -> OrderService<'_> {
    OrderService::new(
        state.pool(),
        state.config().pricing,
        state.mailer().cloned(),
    )
}

fn can_view(identity: UserIdentity, owner: UserId) -> bool {
    identity.user_id == owner || identity.role.is_admin()
}

/// Place an order from the authenticated user's cart.
///
/// # Errors
///
/// Returns 400 for a malformed cart, 404 if a product is missing, 409 if
/// stock is insufficient.
pub async fn create(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = order_service(&state)
        .create_order(identity.user_id, body)
        .await?;

    tracing::info!(
        order_number = %order.order_number,
        user_id = %order.user_id,
        total = %order.total,
        "Order placed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch one order. Owner or admin only.
///
/// # Errors
///
/// Returns 404 if the order does not exist, 403 for a foreign order.
pub async fn show(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    if !can_view(identity, order.user_id) {
        return Err(AppError::Forbidden("Not your order".to_owned()));
    }

    Ok(Json(order))
}

/// List a user's orders, newest first. Owner or admin only.
///
/// # Errors
///
/// Returns 403 when requesting another user's history without admin.
pub async fn list_for_user(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    if !can_view(identity, user_id) {
        return Err(AppError::Forbidden("Not your orders".to_owned()));
    }

    let orders = OrderRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(orders))
}

/// Cancel an order, restoring its stock. Owner or admin only.
///
/// # Errors
///
/// Returns 404 if the order does not exist, 403 for a foreign order, 409 if
/// the order is past the cancellable stage.
pub async fn cancel(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = order_service(&state).cancel_order(id, identity).await?;

    tracing::info!(order_number = %order.order_number, "Order cancelled");
    Ok(Json(order))
}
