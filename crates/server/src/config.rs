//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHARKHA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CHARKHA_TOKEN_SECRET` - Bearer-token signing secret (min 32 chars, high entropy)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - Admin surface credentials
//! - `PAYMENT_KEY_ID` / `PAYMENT_KEY_SECRET` - Payment gateway API credentials
//! - `SHIPPING_EMAIL` / `SHIPPING_PASSWORD` - Shipping provider login
//! - `SHIPPING_ORIGIN_PINCODE` - Six-digit origin PIN for rate quotes
//! - `SMS_ACCOUNT_SID` / `SMS_AUTH_TOKEN` / `SMS_FROM` - SMS provider credentials
//! - `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `SMTP_FROM` - Outbound mail
//!
//! ## Optional
//! - `CHARKHA_HOST` - Bind address (default: 127.0.0.1)
//! - `CHARKHA_PORT` - Listen port (default: 3000)
//! - `PAYMENT_BASE_URL` - Gateway API base (default: https://api.razorpay.com)
//! - `SHIPPING_BASE_URL` - Shipping API base (default: https://apiv2.shiprocket.in)
//! - `SMS_BASE_URL` - SMS API base (default: https://api.twilio.com)
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use charkha_core::{Email, PinCode};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer-token signing secret
    pub token_secret: SecretString,
    /// Admin surface credentials
    pub admin: AdminConfig,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Shipping provider configuration
    pub shipping: ShippingConfig,
    /// SMS OTP provider configuration
    pub sms: SmsConfig,
    /// Outbound mail configuration
    pub smtp: SmtpConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Admin surface credentials.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminConfig {
    /// Admin login email
    pub email: Email,
    /// Admin login password
    pub password: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Payment gateway API configuration.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway API base URL
    pub base_url: String,
    /// Public key id (safe to expose to the checkout client)
    pub key_id: String,
    /// API secret, also the HMAC key for signature verification
    pub key_secret: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish()
    }
}

/// Shipping provider API configuration.
#[derive(Clone)]
pub struct ShippingConfig {
    /// Provider API base URL
    pub base_url: String,
    /// Provider account email for token login
    pub email: String,
    /// Provider account password
    pub password: SecretString,
    /// Warehouse PIN code rate quotes originate from
    pub origin_pincode: PinCode,
}

impl std::fmt::Debug for ShippingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("origin_pincode", &self.origin_pincode)
            .finish()
    }
}

/// SMS OTP provider configuration.
#[derive(Clone)]
pub struct SmsConfig {
    /// Provider API base URL
    pub base_url: String,
    /// Account SID
    pub account_sid: String,
    /// Auth token
    pub auth_token: SecretString,
    /// Sender number or id
    pub from: String,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("base_url", &self.base_url)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

/// Outbound SMTP mail configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP username
    pub username: String,
    /// SMTP password
    pub password: SecretString,
    /// From address for outbound mail, also the contact-form recipient
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CHARKHA_DATABASE_URL")?;
        let host = get_env_or_default("CHARKHA_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHARKHA_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CHARKHA_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHARKHA_PORT".to_string(), e.to_string()))?;
        let token_secret = get_validated_secret("CHARKHA_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "CHARKHA_TOKEN_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            admin: AdminConfig::from_env()?,
            payment: PaymentConfig::from_env()?,
            shipping: ShippingConfig::from_env()?,
            sms: SmsConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("ADMIN_EMAIL")?;
        let email = Email::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;
        Ok(Self {
            email,
            password: get_required_secret("ADMIN_PASSWORD")?,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_env_or_default("PAYMENT_BASE_URL", "https://api.razorpay.com"),
            key_id: get_required_env("PAYMENT_KEY_ID")?,
            key_secret: get_required_secret("PAYMENT_KEY_SECRET")?,
        })
    }
}

impl ShippingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("SHIPPING_ORIGIN_PINCODE")?;
        let origin_pincode = PinCode::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("SHIPPING_ORIGIN_PINCODE".to_string(), e.to_string())
        })?;
        Ok(Self {
            base_url: get_env_or_default("SHIPPING_BASE_URL", "https://apiv2.shiprocket.in"),
            email: get_required_env("SHIPPING_EMAIL")?,
            password: get_required_secret("SHIPPING_PASSWORD")?,
            origin_pincode,
        })
    }
}

impl SmsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_env_or_default("SMS_BASE_URL", "https://api.twilio.com"),
            account_sid: get_required_env("SMS_ACCOUNT_SID")?,
            auth_token: get_required_secret("SMS_AUTH_TOKEN")?,
            from: get_required_env("SMS_FROM")?,
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: get_required_env("SMTP_HOST")?,
            username: get_required_env("SMTP_USERNAME")?,
            password: get_required_secret("SMTP_PASSWORD")?,
            from: get_required_env("SMTP_FROM")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the token signing secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_token_secret(&secret, "TEST_TOKEN");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_token_secret(&secret, "TEST_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_payment_config_debug_redacts_secret() {
        let config = PaymentConfig {
            base_url: "https://api.razorpay.com".to_string(),
            key_id: "rzp_test_key".to_string(),
            key_secret: SecretString::from("super_secret_value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("rzp_test_key"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
    }
}
