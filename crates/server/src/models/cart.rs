//! Cart model and line-merge rules.
//!
//! A cart line is keyed by (product, size, color): re-adding the same
//! variant merges by summing quantity, never duplicating the line. The same
//! rules back the repository's upsert, so the pure methods here are the
//! single place the merge/cap semantics live.

use rust_decimal::Decimal;
use serde::Serialize;

use charkha_core::{CartId, CartLineId, ProductId, UserId};

use super::product::Product;

/// Per-line quantity cap, matching the storefront UI.
pub const MAX_LINE_QUANTITY: u32 = 2;

/// One (product, size, color) entry in a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    /// Denormalized for display; refreshed from the catalog on read.
    pub name: String,
    pub image: Option<String>,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    /// Unit price frozen at add time.
    pub unit_price: Decimal,
}

impl CartLine {
    /// Line total at the frozen unit price.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A user's cart. One open cart per user.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Derived subtotal over current lines. Never stored; recomputed after
    /// every mutation.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Total unit count across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a variant, merging into an existing matching line.
    ///
    /// The merged quantity is capped at [`MAX_LINE_QUANTITY`]. Returns a
    /// copy of the affected line so callers can persist exactly what the
    /// cart now holds.
    pub fn add_line(
        &mut self,
        product: &Product,
        size: &str,
        color: &str,
        quantity: u32,
    ) -> CartLine {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|line| {
            line.product_id == product.id && line.size == size && line.color == color
        }) {
            line.quantity = (line.quantity + quantity).min(MAX_LINE_QUANTITY);
            return line.clone();
        }

        let line = CartLine {
            id: CartLineId::generate(),
            product_id: product.id,
            name: product.name.clone(),
            image: product.primary_image().map(str::to_owned),
            size: size.to_owned(),
            color: color.to_owned(),
            quantity: quantity.min(MAX_LINE_QUANTITY),
            unit_price: product.price,
        };
        self.lines.push(line.clone());
        line
    }

    /// Increment a line's quantity, capped at [`MAX_LINE_QUANTITY`].
    pub fn increment(&mut self, id: CartLineId) -> Option<CartLine> {
        let line = self.lines.iter_mut().find(|line| line.id == id)?;
        line.quantity = (line.quantity + 1).min(MAX_LINE_QUANTITY);
        Some(line.clone())
    }

    /// Decrement a line's quantity, floored at 1. Removal is a separate,
    /// explicit operation.
    pub fn decrement(&mut self, id: CartLineId) -> Option<CartLine> {
        let line = self.lines.iter_mut().find(|line| line.id == id)?;
        line.quantity = line.quantity.saturating_sub(1).max(1);
        Some(line.clone())
    }

    /// Remove a line entirely. Returns whether it existed.
    pub fn remove_line(&mut self, id: CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(price: i64) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Block-print Saree".to_string(),
            description: None,
            price: Decimal::from(price),
            images: vec!["https://cdn.example.com/saree.jpg".to_string()],
            sizes: vec!["free".to_string()],
            colors: vec!["madder".to_string(), "indigo".to_string()],
            quantity: 10,
            category: "sarees".to_string(),
            product_type: None,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart() -> Cart {
        Cart {
            id: CartId::generate(),
            user_id: UserId::generate(),
            lines: Vec::new(),
        }
    }

    #[test]
    fn test_re_adding_same_variant_merges() {
        let mut cart = cart();
        let p = product(500);
        cart.add_line(&p, "free", "madder", 1);
        cart.add_line(&p, "free", "madder", 1);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
    }

    #[test]
    fn test_different_variant_appends() {
        let mut cart = cart();
        let p = product(500);
        cart.add_line(&p, "free", "madder", 1);
        cart.add_line(&p, "free", "indigo", 1);
        assert_eq!(cart.lines.len(), 2);
    }

    #[test]
    fn test_merge_respects_cap() {
        let mut cart = cart();
        let p = product(500);
        cart.add_line(&p, "free", "madder", 2);
        let line = cart.add_line(&p, "free", "madder", 2);
        assert_eq!(line.quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_subtotal_recomputed_after_every_mutation() {
        let mut cart = cart();
        let saree = product(500);
        let stole = product(250);

        cart.add_line(&saree, "free", "madder", 1);
        assert_eq!(cart.subtotal(), Decimal::from(500));

        cart.add_line(&stole, "free", "madder", 2);
        assert_eq!(cart.subtotal(), Decimal::from(1000));

        let line_id = cart.lines[1].id;
        cart.decrement(line_id);
        assert_eq!(cart.subtotal(), Decimal::from(750));

        cart.remove_line(line_id);
        assert_eq!(cart.subtotal(), Decimal::from(500));
    }

    #[test]
    fn test_increment_caps_and_decrement_floors() {
        let mut cart = cart();
        let p = product(500);
        cart.add_line(&p, "free", "madder", 1);
        let id = cart.lines[0].id;

        cart.increment(id);
        let line = cart.increment(id).unwrap();
        assert_eq!(line.quantity, MAX_LINE_QUANTITY);

        cart.decrement(id);
        cart.decrement(id);
        let line = cart.decrement(id).unwrap();
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_unit_price_frozen_at_add_time() {
        let mut cart = cart();
        let mut p = product(500);
        cart.add_line(&p, "free", "madder", 1);
        // Catalog price change after add does not reprice the line
        p.price = Decimal::from(999);
        assert_eq!(cart.lines[0].unit_price, Decimal::from(500));
    }
}
