//! Database operations for the Charkha `PostgreSQL` instance.
//!
//! One repository per entity, all over the same pool:
//!
//! - `users` - Accounts and password hashes
//! - `products` - Catalog (admin-written, order-decremented)
//! - `carts` / `cart_items` - One open cart per user
//! - `orders` / `order_items` - Order ledger with snapshotted lines
//! - `reviews` - Product reviews
//! - `slider_images` - Homepage hero images
//!
//! Queries are runtime-bound (`sqlx::query_as` + `FromRow` row types); the
//! schema lives in `migrations/` and is applied with `sqlx::migrate!` at
//! startup.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use charkha_core::{OrderStatus, ProductId};

pub mod carts;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod sliders;
pub mod users;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use sliders::SliderRepository;
pub use users::UserRepository;

/// Errors surfaced by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed to round-trip into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A conditional stock decrement matched no row: the product would go
    /// negative. The surrounding transaction is rolled back.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// The requested order-status edge is not in the transition table.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
