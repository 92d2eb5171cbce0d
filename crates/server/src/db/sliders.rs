//! Homepage slider repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use charkha_core::SliderImageId;

use super::RepositoryError;
use crate::models::{SliderImage, slider::SliderImageInput};

#[derive(Debug, sqlx::FromRow)]
struct SliderImageRow {
    id: Uuid,
    image_url: String,
    alt_text: Option<String>,
    position: i32,
    created_at: DateTime<Utc>,
}

impl From<SliderImageRow> for SliderImage {
    fn from(row: SliderImageRow) -> Self {
        Self {
            id: SliderImageId::new(row.id),
            image_url: row.image_url,
            alt_text: row.alt_text,
            position: row.position,
            created_at: row.created_at,
        }
    }
}

/// Repository for homepage slider images.
pub struct SliderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SliderRepository<'a> {
    /// Create a new slider repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List slider images in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<SliderImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, SliderImageRow>(
            r"
            SELECT id, image_url, alt_text, position, created_at
            FROM slider_images
            ORDER BY position ASC, created_at ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(SliderImage::from).collect())
    }

    /// Add a slider image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &SliderImageInput) -> Result<SliderImage, RepositoryError> {
        let row = sqlx::query_as::<_, SliderImageRow>(
            r"
            INSERT INTO slider_images (id, image_url, alt_text, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, image_url, alt_text, position, created_at
            ",
        )
        .bind(SliderImageId::generate().as_uuid())
        .bind(&input.image_url)
        .bind(&input.alt_text)
        .bind(input.position)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Remove a slider image.
    ///
    /// # Returns
    ///
    /// Returns `true` if the image was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: SliderImageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM slider_images WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
