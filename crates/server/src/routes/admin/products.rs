//! Admin catalog handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use validator::Validate;

use charkha_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput};
use crate::state::AppState;

/// Create a product.
#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(payload): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    payload.validate()?;

    let product = ProductRepository::new(state.pool()).create(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields.
#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>> {
    payload.validate()?;
    let id = ProductId::parse(&id)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &payload)
        .await?;
    Ok(Json(product))
}

/// Delete a product. Existing order snapshots are unaffected.
#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = ProductId::parse(&id)?;

    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
