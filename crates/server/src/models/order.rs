//! Order model, totals math, and the embedded address.
//!
//! An order owns a snapshot of its line items: price and product metadata
//! are frozen at order-creation time, decoupled from the live catalog.
//! Nothing mutates the snapshot or the address after creation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use charkha_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Phone, PinCode, ProductId,
    UserId,
};

/// Flat fee charged for cash-on-delivery orders.
#[must_use]
pub fn cod_fee() -> Decimal {
    Decimal::from(50)
}

/// Shipping destination embedded in an order.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pin_code: PinCode,
    pub phone: Phone,
}

/// One snapshotted line in an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// Weak reference; the product may be edited or deleted later.
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Line total at the frozen unit price.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A persisted order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub address: Address,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// External order reference at the payment gateway, online orders only.
    pub gateway_order_ref: Option<String>,
    /// Latch: set exactly once, when the order's stock is committed.
    pub inventory_applied: bool,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub cod_fee: Decimal,
    pub total: Decimal,
    /// Set when the order reaches `Completed`; drives the retention sweep.
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Totals computed at order creation and frozen on the order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub cod_fee: Decimal,
    pub total: Decimal,
}

/// Grand-total math for checkout. COD carries a flat handling fee.
#[must_use]
pub fn compute_totals(
    subtotal: Decimal,
    shipping: Decimal,
    payment_method: PaymentMethod,
) -> OrderTotals {
    let cod_fee = match payment_method {
        PaymentMethod::Cod => cod_fee(),
        PaymentMethod::Online => Decimal::ZERO,
    };
    OrderTotals {
        subtotal,
        shipping,
        cod_fee,
        total: subtotal + shipping + cod_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_total_is_subtotal_plus_shipping() {
        // One line at 500, shipping 50
        let totals = compute_totals(
            Decimal::from(500),
            Decimal::from(50),
            PaymentMethod::Online,
        );
        assert_eq!(totals.total, Decimal::from(550));
        assert_eq!(totals.cod_fee, Decimal::ZERO);
    }

    #[test]
    fn test_cod_adds_flat_fee() {
        let totals = compute_totals(Decimal::from(500), Decimal::from(50), PaymentMethod::Cod);
        assert_eq!(totals.total, Decimal::from(600));
        assert_eq!(totals.cod_fee, Decimal::from(50));
    }

    #[test]
    fn test_zero_shipping_fallback() {
        // A failed shipping quote degrades to zero cost
        let totals = compute_totals(Decimal::from(500), Decimal::ZERO, PaymentMethod::Online);
        assert_eq!(totals.total, Decimal::from(500));
    }

    #[test]
    fn test_item_total() {
        let item = OrderItem {
            id: OrderItemId::generate(),
            product_id: ProductId::generate(),
            name: "Kurta".to_string(),
            image: None,
            size: "M".to_string(),
            color: "indigo".to_string(),
            quantity: 2,
            unit_price: Decimal::new(49950, 2),
        };
        assert_eq!(item.total(), Decimal::new(99900, 2));
    }
}
