//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use charkha_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    user_name: String,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            user_name: row.user_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, product_id, user_id, user_name, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Create a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        user_name: &str,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO reviews (id, product_id, user_id, user_name, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, product_id, user_id, user_name, rating, comment, created_at
            ",
        )
        .bind(ReviewId::generate().as_uuid())
        .bind(product_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(user_name)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
