//! Authentication extractors.
//!
//! Handlers take `RequireUser` (any authenticated user) or `RequireAdmin`
//! (admin role claim) as arguments; rejection happens before the handler
//! body runs. Tokens arrive as `Authorization: Bearer <token>`.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use charkha_core::{Role, UserId};

use crate::state::AppState;

/// The authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

/// Extractor that requires a valid bearer token.
pub struct RequireUser(pub CurrentUser);

/// Extractor that additionally requires the admin role claim.
pub struct RequireAdmin(pub CurrentUser);

/// Rejection for the auth extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header present.
    MissingToken,
    /// Token present but unverifiable or expired.
    InvalidToken(String),
    /// Valid token, insufficient role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "missing bearer token".to_owned()),
            Self::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden => (StatusCode::FORBIDDEN, "admin access required".to_owned()),
        };
        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthRejection::MissingToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::MissingToken)?;

    let claims = state
        .tokens()
        .verify(token, unix_now())
        .map_err(|e| AuthRejection::InvalidToken(e.to_string()))?;

    Ok(CurrentUser {
        id: claims.sub,
        role: claims.role,
    })
}

impl<S> FromRequestParts<S> for RequireUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(parts, &state).map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(parts, &state)?;
        if user.role != Role::Admin {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}
