//! Authentication route handlers.
//!
//! Registration and login issue HS256 bearer tokens. The admin login
//! checks the configured admin credentials rather than a user row; its
//! token carries the admin role claim and a nil subject.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use charkha_core::{Email, Phone, Role, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::unix_now;
use crate::models::User;
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 254))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Issued token plus the account it belongs to.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Issued admin token.
#[derive(Debug, Serialize)]
pub struct AdminAuthResponse {
    pub token: String,
    pub role: Role,
}

/// Register a new account.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;
    let email = Email::parse(&payload.email).map_err(|e| AppError::Validation(e.to_string()))?;
    let phone = payload
        .phone
        .as_deref()
        .map(Phone::parse)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let password_hash = hash_password(&payload.password)?;
    let user = UserRepository::new(state.pool())
        .create(&payload.name, &email, phone.as_ref(), &password_hash)
        .await?;

    let token = state.tokens().issue(user.id, user.role, unix_now());
    Ok(Json(AuthResponse { token, user }))
}

/// Login with email and password.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;
    let email = Email::parse(&payload.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let (user, password_hash) = UserRepository::new(state.pool())
        .get_with_password_hash(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_owned()))?;

    if !verify_password(&payload.password, &password_hash) {
        return Err(AppError::Unauthorized("invalid credentials".to_owned()));
    }

    let token = state.tokens().issue(user.id, user.role, unix_now());
    Ok(Json(AuthResponse { token, user }))
}

/// Login against the configured admin credentials.
#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AdminAuthResponse>> {
    payload.validate()?;
    let email = Email::parse(&payload.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let admin = &state.config().admin;
    let password_matches = payload.password == admin.password.expose_secret();
    if email != admin.email || !password_matches {
        return Err(AppError::Unauthorized("invalid credentials".to_owned()));
    }

    // The configured admin is not a user row; the nil subject is never
    // dereferenced, only the role claim is.
    let token = state
        .tokens()
        .issue(UserId::new(uuid::Uuid::nil()), Role::Admin, unix_now());
    Ok(Json(AdminAuthResponse {
        token,
        role: Role::Admin,
    }))
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password with argon2id and a fresh salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash. Any parse failure counts as a
/// mismatch.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_register_request_validation() {
        let bad = RegisterRequest {
            name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            phone: None,
            password: "short".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
