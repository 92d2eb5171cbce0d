//! Catalog product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use charkha_core::ProductId;

/// A catalog product. Written only through the admin surface; `quantity`
/// additionally decremented when orders commit stock.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Ordered image URIs; the first is the listing image.
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Units on hand. Never negative.
    pub quantity: i32,
    pub category: String,
    pub product_type: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the (size, color) pair names a variant this product offers.
    /// An empty variant list means the axis is not used for this product.
    #[must_use]
    pub fn has_variant(&self, size: &str, color: &str) -> bool {
        (self.sizes.is_empty() || self.sizes.iter().any(|s| s == size))
            && (self.colors.is_empty() || self.colors.iter().any(|c| c == color))
    }

    /// The listing image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Admin input for creating or replacing a product.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub product_type: Option<String>,
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("price must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "Handloom Kurta".to_string(),
            description: None,
            price: Decimal::from(500),
            images: vec!["https://cdn.example.com/kurta.jpg".to_string()],
            sizes: vec!["S".to_string(), "M".to_string()],
            colors: vec!["indigo".to_string()],
            quantity: 10,
            category: "kurtas".to_string(),
            product_type: None,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut bad = input();
        bad.price = Decimal::from(-1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_name() {
        let mut bad = input();
        bad.name = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_has_variant_with_empty_axis() {
        let product = Product {
            id: ProductId::generate(),
            name: "Stole".to_string(),
            description: None,
            price: Decimal::from(250),
            images: vec![],
            sizes: vec![],
            colors: vec!["rust".to_string()],
            quantity: 3,
            category: "stoles".to_string(),
            product_type: None,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        // No size axis: any size token passes, color must match
        assert!(product.has_variant("one-size", "rust"));
        assert!(!product.has_variant("one-size", "teal"));
    }
}
