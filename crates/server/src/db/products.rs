//! Product repository.
//!
//! Stock decrements do not live here: they are part of the order
//! transaction in [`super::orders`], conditioned on `quantity >= n`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use charkha_core::ProductId;

use super::RepositoryError;
use crate::models::{Product, ProductInput};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    images: Vec<String>,
    sizes: Vec<String>,
    colors: Vec<String>,
    quantity: i32,
    category: String,
    product_type: Option<String>,
    in_stock: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            images: row.images,
            sizes: row.sizes,
            colors: row.colors,
            quantity: row.quantity,
            category: row.category,
            product_type: row.product_type,
            in_stock: row.in_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, name, description, price, images, sizes, colors, \
                              quantity, category, product_type, in_stock, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = if let Some(category) = category {
            sqlx::query_as::<_, ProductRow>(&format!(
                r"
                SELECT {SELECT_COLUMNS}
                FROM products
                WHERE category = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                ",
            ))
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as::<_, ProductRow>(&format!(
                r"
                SELECT {SELECT_COLUMNS}
                FROM products
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                ",
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {SELECT_COLUMNS}
            FROM products
            WHERE id = $1
            ",
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Get several products at once. Missing IDs are simply absent from the
    /// result; callers decide whether that is an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let uuids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {SELECT_COLUMNS}
            FROM products
            WHERE id = ANY($1)
            ",
        ))
        .bind(&uuids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products
                (id, name, description, price, images, sizes, colors,
                 quantity, category, product_type, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $8 > 0)
            RETURNING {SELECT_COLUMNS}
            ",
        ))
        .bind(ProductId::generate().as_uuid())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.images)
        .bind(&input.sizes)
        .bind(&input.colors)
        .bind(input.quantity)
        .bind(&input.category)
        .bind(&input.product_type)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, images = $5,
                sizes = $6, colors = $7, quantity = $8, category = $9,
                product_type = $10, in_stock = $8 > 0, updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            ",
        ))
        .bind(id.as_uuid())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.images)
        .bind(&input.sizes)
        .bind(&input.colors)
        .bind(input.quantity)
        .bind(&input.category)
        .bind(&input.product_type)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// Order items keep their snapshot; cart lines referencing the product
    /// are removed by the foreign key cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
