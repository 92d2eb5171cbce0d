//! Shipping estimate route handler.
//!
//! The checkout screen calls this as soon as the destination PIN reaches
//! six digits and the cart is non-empty. A provider failure is not an
//! error here: the quote degrades to zero inside the client.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use charkha_core::PinCode;

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Assumed weight per unit, in kilograms.
const ITEM_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Estimate request.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub pin_code: String,
    /// Override for the weight heuristic, if the client knows better.
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub cod: bool,
}

/// Estimate response.
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub shipping_cost: Decimal,
}

/// Quote shipping for the caller's cart to a destination PIN.
#[instrument(skip(state, user, payload))]
pub async fn estimate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(payload): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>> {
    let destination =
        PinCode::parse(&payload.pin_code).map_err(|e| AppError::Validation(e.to_string()))?;

    let cart = CartRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let weight_kg = payload
        .weight_kg
        .unwrap_or_else(|| ITEM_WEIGHT_KG * Decimal::from(cart.item_count()));

    let shipping_cost = state
        .shipping()
        .estimate(&destination, weight_kg, payload.cod)
        .await;

    Ok(Json(EstimateResponse { shipping_cost }))
}
