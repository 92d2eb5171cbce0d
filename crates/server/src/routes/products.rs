//! Catalog route handlers (public, read-only).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use charkha_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List products, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>> {
    let page = i64::from(params.page.unwrap_or(1).max(1));
    let per_page = params
        .per_page
        .map_or(DEFAULT_PER_PAGE, |n| i64::from(n).clamp(1, MAX_PER_PAGE));

    let products = ProductRepository::new(state.pool())
        .list(params.category.as_deref(), per_page, (page - 1) * per_page)
        .await?;

    Ok(Json(products))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = ProductId::parse(&id)?;
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(product))
}
