//! Payment gateway client.
//!
//! Two responsibilities: creating a gateway order for an online checkout,
//! and verifying the signature the gateway hands back after the customer
//! pays. The signature is HMAC-SHA256 over `"{order_ref}|{payment_ref}"`
//! with the API secret, hex-encoded; comparison is constant-time.

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use charkha_core::Price;

use crate::config::PaymentConfig;

type HmacSha256 = Hmac<Sha256>;

/// Outbound request timeout.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The order amount does not fit in the gateway's minor-unit integer.
    #[error("amount out of range for gateway")]
    AmountOutOfRange,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A gateway-side order, created before the customer pays.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    /// Gateway order reference, stored on our order row.
    pub id: String,
    /// Amount in minor units, echoed back by the gateway.
    pub amount: i64,
    pub currency: String,
}

/// Payment gateway API client.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: SecretString,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    /// Public key id, sent to the checkout client alongside the gateway
    /// order reference.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order for `amount`, tagged with our receipt id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the gateway rejects it, or the
    /// amount overflows minor units.
    pub async fn create_order(
        &self,
        amount: Price,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let minor = amount.minor_units().ok_or(PaymentError::AmountOutOfRange)?;
        let url = format!("{}/v1/orders", self.base_url);

        let body = serde_json::json!({
            "amount": minor,
            "currency": amount.currency_code.code(),
            "receipt": receipt,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Verify a payment signature against this client's secret.
    #[must_use]
    pub fn verify_signature(
        &self,
        order_ref: &str,
        payment_ref: &str,
        signature_hex: &str,
    ) -> bool {
        verify_signature(
            self.key_secret.expose_secret().as_bytes(),
            order_ref,
            payment_ref,
            signature_hex,
        )
    }
}

/// Recompute the gateway signature over `"{order_ref}|{payment_ref}"` and
/// compare it with the supplied hex digest in constant time.
#[must_use]
pub fn verify_signature(
    secret: &[u8],
    order_ref: &str,
    payment_ref: &str,
    signature_hex: &str,
) -> bool {
    let Ok(provided) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(order_ref.as_bytes());
    mac.update(b"|");
    mac.update(payment_ref.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"gw_secret_for_tests";

    fn sign(order_ref: &str, payment_ref: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
        mac.update(format!("{order_ref}|{payment_ref}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let sig = sign("order_abc123", "pay_def456");
        assert!(verify_signature(SECRET, "order_abc123", "pay_def456", &sig));
    }

    #[test]
    fn test_mismatched_signature_rejected() {
        let sig = sign("order_abc123", "pay_def456");
        // Same signature, different payment reference
        assert!(!verify_signature(SECRET, "order_abc123", "pay_OTHER", &sig));
        // Same references, signature for a different pair
        let other = sign("order_abc123", "pay_OTHER");
        assert!(!verify_signature(
            SECRET,
            "order_abc123",
            "pay_def456",
            &other
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = sign("order_abc123", "pay_def456");
        assert!(!verify_signature(
            b"another_secret",
            "order_abc123",
            "pay_def456",
            &sig
        ));
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        assert!(!verify_signature(
            SECRET,
            "order_abc123",
            "pay_def456",
            "zz-not-hex"
        ));
    }

    #[test]
    fn test_swapped_refs_rejected() {
        // Concatenation order matters: order_ref|payment_ref, never reversed
        let sig = sign("order_abc123", "pay_def456");
        assert!(!verify_signature(SECRET, "pay_def456", "order_abc123", &sig));
    }
}
