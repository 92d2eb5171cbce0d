//! Product review route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use validator::Validate;

use charkha_core::ProductId;

use crate::db::{ProductRepository, ReviewRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Review, ReviewInput};
use crate::state::AppState;

/// List reviews for a product.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let id = ProductId::parse(&id)?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(Json(reviews))
}

/// Create a review on a product.
#[instrument(skip(state, user, payload))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Json(payload): Json<ReviewInput>,
) -> Result<Json<Review>> {
    payload.validate()?;
    let product_id = ProductId::parse(&id)?;

    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let author = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_owned()))?;

    let review = ReviewRepository::new(state.pool())
        .create(
            product_id,
            user.id,
            &author.name,
            payload.rating,
            payload.comment.as_deref(),
        )
        .await?;

    Ok(Json(review))
}
