//! HS256 bearer tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(hmac)` with an
//! HMAC-SHA256 signature over the first two parts. Claims carry the user
//! id, role, and issue/expiry instants. Verification is constant-time via
//! the `hmac` crate's `verify_slice`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use charkha_core::{Role, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime in seconds (24 hours).
const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Tolerated clock skew for issued-at validation.
const CLOCK_SKEW_SECS: u64 = 60;

/// Fixed JOSE header for every token this server mints.
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Bearer-token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    /// Role claim checked by the admin surface.
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Expiration (Unix timestamp).
    pub exp: u64,
}

/// Token parsing and verification errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format: expected 3 dot-separated parts")]
    InvalidFormat,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token payload")]
    MalformedClaims,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,
}

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
}

impl TokenSigner {
    /// Create a signer from the configured secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Mint a token for a user, valid for 24 hours from `now`.
    #[must_use]
    pub fn issue(&self, user_id: UserId, role: Role, now: u64) -> String {
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        self.sign(&claims)
    }

    /// Sign a claims struct into a complete token.
    #[must_use]
    pub fn sign(&self, claims: &Claims) -> String {
        let header = URL_SAFE_NO_PAD.encode(HEADER);
        // Claims serialization of plain integers and enums cannot fail
        let payload_json = serde_json::to_vec(claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(payload_json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&header, &payload));
        format!("{header}.{payload}.{signature}")
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token is structurally invalid, the
    /// signature does not match, or the claims are outside their validity
    /// window at `now`.
    pub fn verify(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.trim().split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            return Err(TokenError::InvalidFormat);
        };

        let mut mac = self.keyed_mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.verify_slice(&provided)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::MalformedClaims)?;
        let claims: Claims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::MalformedClaims)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.iat > now + CLOCK_SKEW_SECS {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }

    fn keyed_mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"))
    }

    fn mac(&self, header: &str, payload: &str) -> Vec<u8> {
        let mut mac = self.keyed_mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(SecretString::from("k9!vQ2#xW8$mB4&nR7*tZ1@pL5^dH3("))
    }

    #[test]
    fn test_roundtrip() {
        let signer = signer();
        let user_id = UserId::generate();
        let token = signer.issue(user_id, Role::Customer, 1_700_000_000);

        let claims = signer.verify(&token, 1_700_000_100).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Customer);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::generate(), Role::Customer, 1_700_000_000);

        let past_expiry = 1_700_000_000 + TOKEN_TTL_SECS;
        assert_eq!(
            signer.verify(&token, past_expiry),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::generate(), Role::Customer, 1_700_000_000);

        // Swap the payload for one claiming the admin role
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Claims {
            sub: UserId::generate(),
            role: Role::Admin,
            iat: 1_700_000_000,
            exp: 1_700_000_000 + TOKEN_TTL_SECS,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            signer.verify(&forged, 1_700_000_100),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().issue(UserId::generate(), Role::Customer, 1_700_000_000);
        let other = TokenSigner::new(SecretString::from("a different secret entirely 123!"));

        assert_eq!(
            other.verify(&token, 1_700_000_100),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = signer();
        assert_eq!(
            signer.verify("not-a-token", 0),
            Err(TokenError::InvalidFormat)
        );
        assert_eq!(
            signer.verify("a.b", 0),
            Err(TokenError::InvalidFormat)
        );
        assert_eq!(
            signer.verify("a.b.c", 0),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_future_issued_at_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::generate(), Role::Customer, 1_700_009_000);

        assert_eq!(
            signer.verify(&token, 1_700_000_000),
            Err(TokenError::NotYetValid)
        );
    }
}
