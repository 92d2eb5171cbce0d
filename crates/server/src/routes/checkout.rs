//! Checkout route handlers: order creation and payment verification.
//!
//! Order creation is the one multi-entity flow in the system. The sequence
//! is deliberate:
//!
//! 1. Schema validation, then identifier parsing - a malformed product id
//!    fails before anything touches the database.
//! 2. Catalog lookup and variant/stock preconditions.
//! 3. Shipping quote (degrades to zero on provider failure).
//! 4. Order + items persisted `Pending`/`Unpaid` in one transaction, cart
//!    cleared.
//! 5. Online payments: gateway order creation. On gateway failure the
//!    order is compensated to `Failed` before the error surfaces; it is
//!    never left orphaned `Pending`.
//!
//! Payment verification recomputes the gateway signature and, on match,
//! flips the order to `Paid`/`Processing` and commits stock - atomically,
//! exactly once.

use std::collections::HashMap;

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use charkha_core::{IdParseError, OrderId, PaymentMethod, Phone, PinCode, Price, ProductId};

use crate::db::{CartRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Address, Order, OrderItem, compute_totals};
use crate::state::AppState;

/// Assumed weight per unit when quoting shipping, in kilograms.
const ITEM_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// One checkout line, as sent by the client's cart mirror.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutLine {
    pub product_id: String,
    #[validate(length(min = 1, max = 50))]
    pub size: String,
    #[validate(length(min = 1, max = 50))]
    pub color: String,
    #[validate(range(min = 1, max = 10))]
    pub quantity: u32,
}

/// Destination address payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AddressPayload {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    #[validate(length(max = 200))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    pub pin_code: String,
    pub phone: String,
}

/// Checkout payload.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate]
    pub lines: Vec<CheckoutLine>,
    #[validate]
    pub address: AddressPayload,
    pub payment_method: PaymentMethod,
}

/// What the checkout client needs to open the gateway widget.
#[derive(Debug, Serialize)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub key_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Created order plus, for online payments, the gateway handoff.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub payment: Option<PaymentIntent>,
}

/// Payment verification payload from the gateway callback.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    #[validate(length(min = 1, max = 100))]
    pub gateway_order_ref: String,
    #[validate(length(min = 1, max = 100))]
    pub gateway_payment_ref: String,
    #[validate(length(min = 1, max = 200))]
    pub signature: String,
}

/// Parse every referenced product id, rejecting the whole request on the
/// first malformed one. Runs before any database access.
pub fn parse_line_refs(lines: &[CheckoutLine]) -> std::result::Result<Vec<ProductId>, IdParseError> {
    lines
        .iter()
        .map(|line| ProductId::parse(&line.product_id))
        .collect()
}

/// Create an order from the submitted lines.
#[instrument(skip(state, user, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<CheckoutResponse>> {
    payload.validate()?;
    if payload.lines.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one line".to_owned(),
        ));
    }
    let product_ids = parse_line_refs(&payload.lines)?;

    let pin_code = PinCode::parse(&payload.address.pin_code)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let phone = Phone::parse(&payload.address.phone)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let address = Address {
        full_name: payload.address.full_name.clone(),
        line1: payload.address.line1.clone(),
        line2: payload.address.line2.clone(),
        city: payload.address.city.clone(),
        state: payload.address.state.clone(),
        pin_code,
        phone,
    };

    // Snapshot the lines against the live catalog
    let products = ProductRepository::new(state.pool())
        .get_many(&product_ids)
        .await?;
    let by_id: HashMap<ProductId, _> = products.into_iter().map(|p| (p.id, p)).collect();

    let mut items = Vec::with_capacity(payload.lines.len());
    for (line, product_id) in payload.lines.iter().zip(&product_ids) {
        let product = by_id
            .get(product_id)
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

        if !product.has_variant(&line.size, &line.color) {
            return Err(AppError::BadRequest(format!(
                "product {} has no {} / {} variant",
                product.name, line.size, line.color
            )));
        }
        // Precondition only; the authoritative check is the conditional
        // decrement when stock is committed.
        let available = u32::try_from(product.quantity).unwrap_or(0);
        if available < line.quantity {
            return Err(RepositoryError::InsufficientStock(*product_id).into());
        }

        items.push(OrderItem {
            id: charkha_core::OrderItemId::generate(),
            product_id: *product_id,
            name: product.name.clone(),
            image: product.primary_image().map(str::to_owned),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    let subtotal: Decimal = items.iter().map(OrderItem::total).sum();
    let weight_kg = ITEM_WEIGHT_KG
        * Decimal::from(items.iter().map(|item| item.quantity).sum::<u32>());
    let shipping = state
        .shipping()
        .estimate(
            &address.pin_code,
            weight_kg,
            payload.payment_method == PaymentMethod::Cod,
        )
        .await;
    let totals = compute_totals(subtotal, shipping, payload.payment_method);

    let orders = OrderRepository::new(state.pool());
    let mut order = orders
        .create(user.id, items, address, payload.payment_method, totals)
        .await?;

    // The server cart mirrors what was just ordered; drop it either way
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(user.id).await?;
    carts.clear(cart.id).await?;

    let payment = match payload.payment_method {
        PaymentMethod::Cod => None,
        PaymentMethod::Online => {
            let gateway_order = match state
                .payment()
                .create_order(Price::inr(totals.total), &order.id.to_string())
                .await
            {
                Ok(gateway_order) => gateway_order,
                Err(e) => {
                    // Compensate: never leave the order orphaned Pending
                    orders.mark_failed(order.id).await?;
                    return Err(e.into());
                }
            };

            orders.set_gateway_ref(order.id, &gateway_order.id).await?;
            order.gateway_order_ref = Some(gateway_order.id.clone());

            Some(PaymentIntent {
                gateway_order_id: gateway_order.id,
                key_id: state.payment().key_id().to_owned(),
                amount: gateway_order.amount,
                currency: gateway_order.currency,
            })
        }
    };

    Ok(Json(CheckoutResponse { order, payment }))
}

/// Verify a gateway payment signature and settle the order.
#[instrument(skip(state, user, payload))]
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<Order>> {
    payload.validate()?;
    let order_id = OrderId::parse(&payload.order_id)?;

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if order.user_id != user.id {
        return Err(AppError::Forbidden("not your order".to_owned()));
    }
    if order.gateway_order_ref.as_deref() != Some(payload.gateway_order_ref.as_str()) {
        return Err(AppError::BadRequest(
            "gateway order reference does not match this order".to_owned(),
        ));
    }

    // Signature mismatch rejects regardless of any other field being right
    if !state.payment().verify_signature(
        &payload.gateway_order_ref,
        &payload.gateway_payment_ref,
        &payload.signature,
    ) {
        return Err(AppError::BadRequest("invalid payment signature".to_owned()));
    }

    let order = orders.confirm_payment(order_id).await?;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product_id: &str) -> CheckoutLine {
        CheckoutLine {
            product_id: product_id.to_owned(),
            size: "M".to_string(),
            color: "indigo".to_string(),
            quantity: 1,
        }
    }

    #[test]
    fn test_parse_line_refs_accepts_well_formed_ids() {
        let lines = vec![
            line(&ProductId::generate().to_string()),
            line(&ProductId::generate().to_string()),
        ];
        assert_eq!(parse_line_refs(&lines).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_product_id_fails_fast() {
        // One malformed reference poisons the whole request, before any
        // database call can run
        let lines = vec![
            line(&ProductId::generate().to_string()),
            line("64db1f7a9c2e4b0012345678"),
        ];
        assert!(parse_line_refs(&lines).is_err());
    }

    #[test]
    fn test_nested_line_validation() {
        let mut bad_line = line(&ProductId::generate().to_string());
        bad_line.quantity = 0;
        let request = CreateOrderRequest {
            lines: vec![bad_line],
            address: AddressPayload {
                full_name: "Meera Kapoor".to_string(),
                line1: "14 Gandhi Road".to_string(),
                line2: None,
                city: "Jaipur".to_string(),
                state: "Rajasthan".to_string(),
                pin_code: "302001".to_string(),
                phone: "9876543210".to_string(),
            },
            payment_method: PaymentMethod::Cod,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_item_weight_constant() {
        assert_eq!(ITEM_WEIGHT_KG, Decimal::new(5, 1));
    }
}
