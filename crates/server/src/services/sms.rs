//! SMS provider client.
//!
//! Thin wrapper over the provider's message endpoint, used only for OTP
//! dispatch. Messages are fire-and-forget from the caller's perspective;
//! delivery receipts are not consumed.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use charkha_core::Phone;

use crate::config::SmsConfig;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when sending SMS.
#[derive(Debug, Error)]
pub enum SmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// SMS provider API client.
#[derive(Clone)]
pub struct SmsClient {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

impl SmsClient {
    /// Create a new SMS provider client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SmsConfig) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
        })
    }

    /// Send a text message to a phone number.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rejects it.
    pub async fn send(&self, to: &Phone, body: &str) -> Result<(), SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let params = [("To", to.e164()), ("From", self.from.clone()), ("Body", body.to_owned())];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SmsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
