//! Homepage slider image model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use charkha_core::SliderImageId;

/// One image in the homepage hero slider.
#[derive(Debug, Clone, Serialize)]
pub struct SliderImage {
    pub id: SliderImageId,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Admin input for adding a slider image.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SliderImageInput {
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 200))]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub position: i32,
}
