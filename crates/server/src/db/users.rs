//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use charkha_core::{Email, Phone, Role, UserId};

use super::RepositoryError;
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            phone,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        phone: Option<&Phone>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, 'customer')
            RETURNING id, name, email, phone, role, created_at, updated_at
            ",
        )
        .bind(UserId::generate().as_uuid())
        .bind(name)
        .bind(email.as_str())
        .bind(phone.map(Phone::as_str))
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already registered".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored contact field is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, phone, role, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(Debug, sqlx::FromRow)]
        struct UserWithHashRow {
            id: Uuid,
            name: String,
            email: String,
            phone: Option<String>,
            role: Role,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, name, email, phone, role, created_at, updated_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash = row.password_hash.clone();
        let user = User::try_from(UserRow {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })?;

        Ok(Some((user, password_hash)))
    }
}
