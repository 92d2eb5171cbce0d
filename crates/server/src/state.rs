//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::mailer::{Mailer, MailerError};
use crate::services::otp::OtpService;
use crate::services::payment::{PaymentClient, PaymentError};
use crate::services::shipping::{ShippingClient, ShippingError};
use crate::services::sms::{SmsClient, SmsError};
use crate::services::token::TokenSigner;

/// Error constructing the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("shipping client: {0}")]
    Shipping(#[from] ShippingError),
    #[error("sms client: {0}")]
    Sms(#[from] SmsError),
    #[error("mailer: {0}")]
    Mailer(#[from] MailerError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    payment: PaymentClient,
    shipping: ShippingClient,
    otp: OtpService,
    mailer: Mailer,
    tokens: TokenSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if any external-service client fails to construct.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateInitError> {
        let payment = PaymentClient::new(&config.payment)?;
        let shipping = ShippingClient::new(&config.shipping)?;
        let sms = SmsClient::new(&config.sms)?;
        let mailer = Mailer::new(&config.smtp)?;
        let otp = OtpService::new(sms, mailer.clone());
        let tokens = TokenSigner::new(config.token_secret.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payment,
                shipping,
                otp,
                mailer,
                tokens,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payment(&self) -> &PaymentClient {
        &self.inner.payment
    }

    /// Get a reference to the shipping provider client.
    #[must_use]
    pub fn shipping(&self) -> &ShippingClient {
        &self.inner.shipping
    }

    /// Get a reference to the OTP service.
    #[must_use]
    pub fn otp(&self) -> &OtpService {
        &self.inner.otp
    }

    /// Get a reference to the mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Get a reference to the bearer-token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }
}
