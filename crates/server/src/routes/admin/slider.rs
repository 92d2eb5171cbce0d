//! Admin slider handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use validator::Validate;

use charkha_core::SliderImageId;

use crate::db::SliderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{SliderImage, slider::SliderImageInput};
use crate::state::AppState;

/// Add a slider image.
#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(payload): Json<SliderImageInput>,
) -> Result<(StatusCode, Json<SliderImage>)> {
    payload.validate()?;

    let image = SliderRepository::new(state.pool()).create(&payload).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// Remove a slider image.
#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = SliderImageId::parse(&id)?;

    if !SliderRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("slider image {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
