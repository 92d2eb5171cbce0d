//! Admin surface: privileged CRUD over the catalog and order ledger.
//!
//! Every handler takes the `RequireAdmin` extractor, so a missing or
//! non-admin token is rejected before any body parsing.

pub mod orders;
pub mod products;
pub mod slider;

use axum::{
    Router,
    routing::{delete, post, put},
};

use crate::state::AppState;

/// Create the admin routes router, mounted under `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", axum::routing::get(orders::index))
        .route("/orders/{id}", put(orders::update_status))
        .route("/orders/{id}/ship", post(orders::ship))
        .route("/products", post(products::create))
        .route(
            "/products/{id}",
            put(products::update).delete(products::remove),
        )
        .route("/slider", post(slider::create))
        .route("/slider/{id}", delete(slider::remove))
}
