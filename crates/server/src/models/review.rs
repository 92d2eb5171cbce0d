//! Product review model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use charkha_core::{ProductId, ReviewId, UserId};

/// A customer review on a product.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Reviewer display name, denormalized at write time.
    pub user_name: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a review.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let ok = ReviewInput {
            rating: 5,
            comment: None,
        };
        assert!(ok.validate().is_ok());

        let low = ReviewInput {
            rating: 0,
            comment: None,
        };
        assert!(low.validate().is_err());

        let high = ReviewInput {
            rating: 6,
            comment: None,
        };
        assert!(high.validate().is_err());
    }
}
