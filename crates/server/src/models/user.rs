//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use charkha_core::{Email, Phone, Role, UserId};

/// A registered user. The password hash lives only in the repository layer,
/// never on this struct.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
