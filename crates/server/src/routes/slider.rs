//! Homepage slider route handler (public, read-only).

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::SliderRepository;
use crate::error::Result;
use crate::models::SliderImage;
use crate::state::AppState;

/// List slider images in display order.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<SliderImage>>> {
    let images = SliderRepository::new(state.pool()).list().await?;
    Ok(Json(images))
}
