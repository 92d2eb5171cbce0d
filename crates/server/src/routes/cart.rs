//! Cart route handlers.
//!
//! The server cart is the authoritative copy the order is eventually built
//! from; the client keeps its own optimistic mirror during shopping.
//! Every mutation loads the cart, applies the merge/cap rules from
//! [`crate::models::Cart`], persists the affected line, and returns the
//! cart with freshly recomputed totals.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use charkha_core::{CartId, CartLineId, ProductId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Cart, CartLine};
use crate::state::AppState;

/// Cart response with derived totals.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
            lines: cart.lines,
        }
    }
}

/// Add-to-cart payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AddLineRequest {
    pub product_id: String,
    #[validate(length(min = 1, max = 50))]
    pub size: String,
    #[validate(length(min = 1, max = 50))]
    pub color: String,
    #[validate(range(min = 1, max = 10))]
    pub quantity: Option<u32>,
}

/// Quantity mutation on an existing line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAction {
    Increment,
    Decrement,
}

/// Line-update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub action: LineAction,
}

/// Current cart with totals.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    Ok(Json(cart.into()))
}

/// Add a variant to the cart, merging into an existing matching line.
#[instrument(skip(state, user, payload))]
pub async fn add_line(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(payload): Json<AddLineRequest>,
) -> Result<Json<CartView>> {
    payload.validate()?;
    let product_id = ProductId::parse(&payload.product_id)?;

    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    if !product.in_stock {
        return Err(AppError::BadRequest("product is out of stock".to_owned()));
    }
    if !product.has_variant(&payload.size, &payload.color) {
        return Err(AppError::BadRequest(format!(
            "product has no {} / {} variant",
            payload.size, payload.color
        )));
    }

    let carts = CartRepository::new(state.pool());
    let mut cart = carts.get_or_create(user.id).await?;
    let line = cart.add_line(
        &product,
        &payload.size,
        &payload.color,
        payload.quantity.unwrap_or(1),
    );
    carts.upsert_line(cart.id, &line).await?;

    Ok(Json(cart.into()))
}

/// Increment or decrement a line's quantity.
#[instrument(skip(state, user, payload))]
pub async fn update_line(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLineRequest>,
) -> Result<Json<CartView>> {
    let line_id = CartLineId::parse(&id)?;

    let carts = CartRepository::new(state.pool());
    let mut cart = carts.get_or_create(user.id).await?;

    let line = match payload.action {
        LineAction::Increment => cart.increment(line_id),
        LineAction::Decrement => cart.decrement(line_id),
    }
    .ok_or_else(|| AppError::NotFound(format!("cart line {line_id}")))?;

    carts
        .set_line_quantity(cart.id, line.id, line.quantity)
        .await?;

    Ok(Json(cart.into()))
}

/// Remove a line from the cart.
#[instrument(skip(state, user))]
pub async fn remove_line(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<CartView>> {
    let line_id = CartLineId::parse(&id)?;

    let carts = CartRepository::new(state.pool());
    let mut cart = carts.get_or_create(user.id).await?;

    if !cart.remove_line(line_id) {
        return Err(AppError::NotFound(format!("cart line {line_id}")));
    }
    carts.delete_line(cart.id, line_id).await?;

    Ok(Json(cart.into()))
}
