//! One-time-code issuance and verification.
//!
//! A single service covers both channels: SMS for phone numbers, SMTP for
//! email addresses. Codes live in a keyed TTL cache - never the database -
//! and are strictly single-use: a successful verification removes the code,
//! as does a verification attempt after expiry. Expiry is checked against
//! an explicit instant carried on the record; the cache's own TTL is only
//! the sweep that evicts records nobody verified.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use rand::Rng;
use thiserror::Error;

use charkha_core::{Email, Phone};

use super::mailer::Mailer;
use super::sms::SmsClient;

/// Codes expire five minutes after issuance.
const CODE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on pending codes; far beyond realistic load.
const STORE_CAPACITY: u64 = 100_000;

/// Errors from OTP issuance and verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    /// The SMS or email channel failed to dispatch the code.
    #[error("failed to dispatch code: {0}")]
    Dispatch(String),

    /// No pending code exists for this identifier.
    #[error("no pending code for this identifier")]
    NotFound,

    /// The pending code expired; it has been removed.
    #[error("code expired, request a new one")]
    Expired,

    /// The supplied code does not match.
    #[error("incorrect code")]
    Mismatch,
}

#[derive(Debug, Clone)]
struct IssuedCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Keyed short-lived code storage with native TTL eviction.
struct CodeStore {
    cache: Cache<String, IssuedCode>,
    ttl: chrono::Duration,
}

impl CodeStore {
    fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(STORE_CAPACITY)
                // Sweep at twice the logical TTL; `expires_at` is authoritative
                .time_to_live(ttl * 2)
                .build(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(5)),
        }
    }

    /// Issue a fresh code for `key`, replacing any pending one.
    async fn issue(&self, key: String, now: DateTime<Utc>) -> String {
        let code = generate_code();
        self.cache
            .insert(
                key,
                IssuedCode {
                    code: code.clone(),
                    expires_at: now + self.ttl,
                },
            )
            .await;
        code
    }

    /// Verify `code` for `key` as of `now`. Single-use on success; expired
    /// records are removed on the failed attempt that discovers them.
    async fn verify_at(
        &self,
        key: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        let Some(pending) = self.cache.get(key).await else {
            return Err(OtpError::NotFound);
        };

        if now >= pending.expires_at {
            self.cache.invalidate(key).await;
            return Err(OtpError::Expired);
        }

        if pending.code != code {
            return Err(OtpError::Mismatch);
        }

        self.cache.invalidate(key).await;
        Ok(())
    }
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000))
}

fn phone_key(phone: &Phone) -> String {
    format!("sms:{phone}")
}

fn email_key(email: &Email) -> String {
    format!("email:{email}")
}

/// OTP issuance and verification over SMS and email.
pub struct OtpService {
    store: CodeStore,
    sms: SmsClient,
    mailer: Mailer,
}

impl OtpService {
    /// Create the OTP service with its dispatch channels.
    #[must_use]
    pub fn new(sms: SmsClient, mailer: Mailer) -> Self {
        Self {
            store: CodeStore::new(CODE_TTL),
            sms,
            mailer,
        }
    }

    /// Issue and dispatch a code to a phone number.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::Dispatch` if the SMS provider call fails.
    pub async fn request_phone_code(&self, phone: &Phone) -> Result<(), OtpError> {
        let code = self.store.issue(phone_key(phone), Utc::now()).await;
        let body = format!("{code} is your Charkha verification code. Valid for 5 minutes.");
        self.sms
            .send(phone, &body)
            .await
            .map_err(|e| OtpError::Dispatch(e.to_string()))
    }

    /// Issue and dispatch a code to an email address.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::Dispatch` if the mail relay call fails.
    pub async fn request_email_code(&self, email: &Email) -> Result<(), OtpError> {
        let code = self.store.issue(email_key(email), Utc::now()).await;
        let body = format!("{code} is your Charkha verification code. Valid for 5 minutes.");
        self.mailer
            .send(email, "Your Charkha verification code", body)
            .await
            .map_err(|e| OtpError::Dispatch(e.to_string()))
    }

    /// Verify a phone code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Expired`, or `Mismatch` per the pending record.
    pub async fn verify_phone_code(&self, phone: &Phone, code: &str) -> Result<(), OtpError> {
        self.store
            .verify_at(&phone_key(phone), code, Utc::now())
            .await
    }

    /// Verify an email code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Expired`, or `Mismatch` per the pending record.
    pub async fn verify_email_code(&self, email: &Email, code: &str) -> Result<(), OtpError> {
        self.store
            .verify_at(&email_key(email), code, Utc::now())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let store = CodeStore::new(CODE_TTL);
        let code = store.issue("sms:9876543210".to_owned(), now()).await;
        assert_eq!(code.len(), 6);
        assert!(
            store
                .verify_at("sms:9876543210", &code, now())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_single_use() {
        let store = CodeStore::new(CODE_TTL);
        let code = store.issue("sms:9876543210".to_owned(), now()).await;

        store
            .verify_at("sms:9876543210", &code, now())
            .await
            .unwrap();
        // The code was consumed; a replay finds nothing
        assert_eq!(
            store.verify_at("sms:9876543210", &code, now()).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_correct_code_after_expiry_fails() {
        let store = CodeStore::new(CODE_TTL);
        let issued_at = now();
        let code = store.issue("email:a@b.com".to_owned(), issued_at).await;

        let past_expiry = issued_at + chrono::Duration::minutes(6);
        assert_eq!(
            store.verify_at("email:a@b.com", &code, past_expiry).await,
            Err(OtpError::Expired)
        );
        // The expired record was removed, not left to match later
        assert_eq!(
            store.verify_at("email:a@b.com", &code, issued_at).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_mismatch_keeps_pending_code() {
        let store = CodeStore::new(CODE_TTL);
        let code = store.issue("sms:9876543210".to_owned(), now()).await;
        let wrong = if code == "000000" { "000001" } else { "000000" };

        assert_eq!(
            store.verify_at("sms:9876543210", wrong, now()).await,
            Err(OtpError::Mismatch)
        );
        // A wrong guess does not burn the real code
        assert!(
            store
                .verify_at("sms:9876543210", &code, now())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_no_pending_code() {
        let store = CodeStore::new(CODE_TTL);
        assert_eq!(
            store.verify_at("sms:9876543210", "123456", now()).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_reissue_replaces_pending_code() {
        let store = CodeStore::new(CODE_TTL);
        let first = store.issue("sms:9876543210".to_owned(), now()).await;
        let second = store.issue("sms:9876543210".to_owned(), now()).await;

        if first != second {
            assert_eq!(
                store.verify_at("sms:9876543210", &first, now()).await,
                Err(OtpError::Mismatch)
            );
        }
        assert!(
            store
                .verify_at("sms:9876543210", &second, now())
                .await
                .is_ok()
        );
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
