//! Cart repository.
//!
//! One open cart per user (unique index on `carts.user_id`). Line
//! uniqueness on (cart, product, size, color) is a database constraint, so
//! the merge rule in [`crate::models::Cart`] can never be bypassed by a
//! racing request: the second writer lands on the same row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use charkha_core::{CartId, CartLineId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    image: Option<String>,
    size: String,
    color: String,
    quantity: i32,
    unit_price: Decimal,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} on cart line {}",
                row.quantity, row.id
            ))
        })?;

        Ok(Self {
            id: CartLineId::new(row.id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            image: row.image,
            size: row.size,
            color: row.color,
            quantity,
            unit_price: row.unit_price,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one if none exists.
    ///
    /// Line display fields (name, image) are joined fresh from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(CartId::generate().as_uuid())
        .bind(user_id.as_uuid())
        .execute(self.pool)
        .await?;

        let cart_row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_one(self.pool)
        .await?;

        let line_rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.product_id, p.name, (p.images)[1] AS image,
                   ci.size, ci.color, ci.quantity, ci.unit_price, ci.created_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(cart_row.id)
        .fetch_all(self.pool)
        .await?;

        let lines = line_rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart {
            id: CartId::new(cart_row.id),
            user_id: UserId::new(cart_row.user_id),
            lines,
        })
    }

    /// Persist a line as computed by the cart's merge rules.
    ///
    /// A concurrent add of the same variant lands on the same row via the
    /// unique (cart, product, size, color) constraint; the unit price frozen
    /// at first add wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_line(
        &self,
        cart_id: CartId,
        line: &CartLine,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart_items
                (id, cart_id, product_id, size, color, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (cart_id, product_id, size, color)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(line.id.as_uuid())
        .bind(cart_id.as_uuid())
        .bind(line.product_id.as_uuid())
        .bind(&line.size)
        .bind(&line.color)
        .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
        .bind(line.unit_price)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_line_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = $3
            WHERE id = $1 AND cart_id = $2
            ",
        )
        .bind(line_id.as_uuid())
        .bind(cart_id.as_uuid())
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Returns
    ///
    /// Returns `true` if the line was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_line(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE id = $1 AND cart_id = $2
            ",
        )
        .bind(line_id.as_uuid())
        .bind(cart_id.as_uuid())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line from the cart. Called once the cart has become an
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
