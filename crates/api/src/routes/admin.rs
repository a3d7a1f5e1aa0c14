//! Admin route handlers: account and order oversight plus the dashboard
//! statistics projection.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use protech_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Order, User};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// Target fulfillment status.
    pub status: OrderStatus,
}

/// Dashboard statistics projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_orders: i64,
    pub total_products: i64,
    pub total_revenue: Decimal,
    /// Order count per status, zero-filled for statuses with no orders.
    pub orders_by_status: BTreeMap<String, i64>,
}

/// List every account, newest first.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// List every order, newest first.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// Advance an order along the fulfillment chain.
///
/// Delivering settles a pending cash-on-delivery payment; cancelling
/// restores stock.
///
/// # Errors
///
/// Returns 404 if the order does not exist, 409 for a transition the state
/// machine forbids.
pub async fn update_order_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Order>> {
    let service = OrderService::new(
        state.pool(),
        state.config().pricing,
        state.mailer().cloned(),
    );
    let order = service.update_status(id, body.status).await?;

    tracing::info!(
        order_number = %order.order_number,
        status = %order.status,
        "Order status updated"
    );
    Ok(Json(order))
}

/// Purge an order entirely.
///
/// Administrative cleanup, not a cancellation: stock is deliberately not
/// restored. Use the status route to cancel.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn purge_order(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    let deleted = OrderRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("order".to_owned()));
    }

    tracing::info!(order_id = %id, "Order purged");
    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard statistics.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>> {
    let orders_repo = OrderRepository::new(state.pool());

    let total_users = UserRepository::new(state.pool()).count().await?;
    let total_products = ProductRepository::new(state.pool()).count().await?;
    let total_orders = orders_repo.count().await?;
    let total_revenue = orders_repo.total_revenue().await?;

    // Zero-fill so the dashboard always sees every status.
    let mut orders_by_status: BTreeMap<String, i64> = OrderStatus::ALL
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    for (status, count) in orders_repo.count_by_status().await? {
        orders_by_status.insert(status.to_string(), count);
    }

    Ok(Json(StatsResponse {
        total_users,
        total_orders,
        total_products,
        total_revenue,
        orders_by_status,
    }))
}
