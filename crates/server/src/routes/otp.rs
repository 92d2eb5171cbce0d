//! OTP route handlers.
//!
//! Checkout verifies the customer's phone (and optionally email) before an
//! order can be placed. Codes are issued by [`crate::services::otp`]; these
//! handlers only parse identifiers and relay outcomes.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use charkha_core::{Email, Phone};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// SMS dispatch/verify payloads.
#[derive(Debug, Deserialize)]
pub struct PhonePayload {
    pub phone: String,
    pub code: Option<String>,
}

/// Email dispatch/verify payloads.
#[derive(Debug, Deserialize)]
pub struct EmailPayload {
    pub email: String,
    pub code: Option<String>,
}

/// Dispatch acknowledgement.
#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub status: &'static str,
}

/// Send an SMS code.
#[instrument(skip(state, payload))]
pub async fn send_sms(
    State(state): State<AppState>,
    Json(payload): Json<PhonePayload>,
) -> Result<Json<OtpResponse>> {
    let phone =
        Phone::parse(&payload.phone).map_err(|e| AppError::Validation(e.to_string()))?;
    state.otp().request_phone_code(&phone).await?;
    Ok(Json(OtpResponse { status: "sent" }))
}

/// Verify an SMS code.
#[instrument(skip(state, payload))]
pub async fn verify_sms(
    State(state): State<AppState>,
    Json(payload): Json<PhonePayload>,
) -> Result<Json<OtpResponse>> {
    let phone =
        Phone::parse(&payload.phone).map_err(|e| AppError::Validation(e.to_string()))?;
    let code = payload
        .code
        .ok_or_else(|| AppError::Validation("code is required".to_owned()))?;
    state.otp().verify_phone_code(&phone, &code).await?;
    Ok(Json(OtpResponse { status: "verified" }))
}

/// Send an email code.
#[instrument(skip(state, payload))]
pub async fn send_email(
    State(state): State<AppState>,
    Json(payload): Json<EmailPayload>,
) -> Result<Json<OtpResponse>> {
    let email =
        Email::parse(&payload.email).map_err(|e| AppError::Validation(e.to_string()))?;
    state.otp().request_email_code(&email).await?;
    Ok(Json(OtpResponse { status: "sent" }))
}

/// Verify an email code.
#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<EmailPayload>,
) -> Result<Json<OtpResponse>> {
    let email =
        Email::parse(&payload.email).map_err(|e| AppError::Validation(e.to_string()))?;
    let code = payload
        .code
        .ok_or_else(|| AppError::Validation("code is required".to_owned()))?;
    state.otp().verify_email_code(&email, &code).await?;
    Ok(Json(OtpResponse { status: "verified" }))
}
