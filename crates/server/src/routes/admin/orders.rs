//! Admin order handlers: listing, status transitions, shipment dispatch.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use charkha_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::services::shipping::Shipment;
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 50;
const MAX_PER_PAGE: i64 = 200;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Status-transition payload.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// List all orders, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>> {
    let page = i64::from(params.page.unwrap_or(1).max(1));
    let per_page = params
        .per_page
        .map_or(DEFAULT_PER_PAGE, |n| i64::from(n).clamp(1, MAX_PER_PAGE));

    let orders = OrderRepository::new(state.pool())
        .list_all(per_page, (page - 1) * per_page)
        .await?;

    Ok(Json(orders))
}

/// Transition an order's status.
///
/// The edge is validated against the transition table; entering a
/// committed status commits stock exactly once, and a repeated call with
/// the same status is a no-op - quantity never decrements twice.
#[instrument(skip(state, _admin, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order_id = OrderId::parse(&id)?;

    let order = OrderRepository::new(state.pool())
        .transition(order_id, payload.status)
        .await?;

    Ok(Json(order))
}

/// Register a shipment with the shipping provider for a committed order.
#[instrument(skip(state, _admin))]
pub async fn ship(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Shipment>> {
    let order_id = OrderId::parse(&id)?;

    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if !order.order_status.is_committed() {
        return Err(AppError::BadRequest(format!(
            "order is {}; only confirmed or processing orders can ship",
            order.order_status
        )));
    }

    let shipment = state.shipping().create_shipment(&order).await?;
    Ok(Json(shipment))
}
