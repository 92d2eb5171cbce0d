//! Shipping provider client.
//!
//! The provider authenticates with an email/password login that returns a
//! bearer token valid for days; the token is cached with a TTL and fetched
//! lazily. Rate quotes deliberately degrade to zero on any failure - the
//! storefront treats "no quote" as free shipping rather than blocking
//! checkout - while shipment creation surfaces its errors.

use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use charkha_core::PinCode;

use crate::config::ShippingConfig;
use crate::models::Order;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider tokens are valid for ~10 days; refresh well before that.
const TOKEN_TTL: Duration = Duration::from_secs(8 * 24 * 60 * 60);

/// Errors that can occur when interacting with the shipping provider.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Login failed or the cached token could not be refreshed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A created shipment at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub order_id: i64,
    pub shipment_id: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    data: RateData,
}

#[derive(Debug, Deserialize)]
struct RateData {
    #[serde(default)]
    available_courier_companies: Vec<CourierRate>,
}

#[derive(Debug, Deserialize)]
struct CourierRate {
    rate: f64,
}

/// Shipping provider API client.
#[derive(Clone)]
pub struct ShippingClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    password: SecretString,
    origin_pincode: PinCode,
    /// Single-entry token cache; the unit key keeps moka's TTL handling.
    token_cache: Cache<(), String>,
}

impl ShippingClient {
    /// Create a new shipping provider client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShippingConfig) -> Result<Self, ShippingError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            email: config.email.clone(),
            password: config.password.clone(),
            origin_pincode: config.origin_pincode.clone(),
            token_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(TOKEN_TTL)
                .build(),
        })
    }

    /// Estimate shipping cost to `destination` for a shipment of
    /// `weight_kg`.
    ///
    /// Any failure - network, auth, parse, no couriers serving the lane -
    /// degrades to a zero quote with a warning log.
    pub async fn estimate(&self, destination: &PinCode, weight_kg: Decimal, cod: bool) -> Decimal {
        match self.quote(destination, weight_kg, cod).await {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!(
                    destination = %destination,
                    error = %e,
                    "shipping quote failed, treating as zero cost"
                );
                Decimal::ZERO
            }
        }
    }

    /// The fallible quote: cheapest courier rate for the lane.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no courier serves the lane.
    async fn quote(
        &self,
        destination: &PinCode,
        weight_kg: Decimal,
        cod: bool,
    ) -> Result<Decimal, ShippingError> {
        let token = self.token().await?;
        let url = format!(
            "{}/v1/external/courier/serviceability/?pickup_postcode={}&delivery_postcode={}&weight={}&cod={}",
            self.base_url,
            self.origin_pincode,
            destination,
            weight_kg,
            u8::from(cod),
        );

        let response = self.client.get(&url).bearer_auth(&token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ShippingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rates: RateResponse = response
            .json()
            .await
            .map_err(|e| ShippingError::Parse(e.to_string()))?;

        rates
            .data
            .available_courier_companies
            .iter()
            .filter_map(|courier| Decimal::from_f64(courier.rate))
            .min()
            .ok_or_else(|| ShippingError::Parse("no couriers serve this lane".to_owned()))
    }

    /// Register a shipment for a confirmed order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails; unlike quotes, dispatch errors
    /// are surfaced to the admin caller.
    pub async fn create_shipment(&self, order: &Order) -> Result<Shipment, ShippingError> {
        let token = self.token().await?;
        let url = format!("{}/v1/external/orders/create/adhoc", self.base_url);

        let items: Vec<serde_json::Value> = order
            .items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "name": item.name,
                    "sku": item.product_id.to_string(),
                    "units": item.quantity,
                    "selling_price": item.unit_price,
                })
            })
            .collect();

        let body = serde_json::json!({
            "order_id": order.id.to_string(),
            "order_date": order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            "billing_customer_name": order.address.full_name,
            "billing_address": order.address.line1,
            "billing_address_2": order.address.line2,
            "billing_city": order.address.city,
            "billing_state": order.address.state,
            "billing_pincode": order.address.pin_code,
            "billing_phone": order.address.phone,
            "shipping_is_billing": true,
            "order_items": items,
            "payment_method": match order.payment_method {
                charkha_core::PaymentMethod::Cod => "COD",
                charkha_core::PaymentMethod::Online => "Prepaid",
            },
            "sub_total": order.subtotal,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ShippingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Shipment>()
            .await
            .map_err(|e| ShippingError::Parse(e.to_string()))
    }

    /// Get the cached provider token, logging in if absent or expired.
    async fn token(&self) -> Result<String, ShippingError> {
        self.token_cache
            .try_get_with((), self.login())
            .await
            .map_err(|e| ShippingError::Auth(e.to_string()))
    }

    async fn login(&self) -> Result<String, ShippingError> {
        let url = format!("{}/v1/external/auth/login", self.base_url);
        let body = serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ShippingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ShippingError::Parse(e.to_string()))?;

        Ok(login.token)
    }
}
