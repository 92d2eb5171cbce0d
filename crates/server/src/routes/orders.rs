//! Order history route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Order;
use crate::state::AppState;

/// The caller's orders, newest first.
#[instrument(skip(state, user))]
pub async fn mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}
