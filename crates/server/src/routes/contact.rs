//! Contact form route handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use charkha_core::Email;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Contact form payload.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

/// Acknowledgement.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub status: &'static str,
}

/// Relay a contact-form submission to the store inbox.
#[instrument(skip(state, payload))]
pub async fn send(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<Json<ContactResponse>> {
    payload.validate()?;
    let reply_to =
        Email::parse(&payload.email).map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .mailer()
        .send_contact(&reply_to, &payload.name, &payload.message)
        .await?;

    Ok(Json(ContactResponse { status: "sent" }))
}
