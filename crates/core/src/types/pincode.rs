//! Postal code (PIN code) type.
//!
//! Shipping quotes are keyed by six-digit Indian PIN codes. The shipping
//! estimator only fires once a destination reaches this shape, so the
//! validation lives here rather than in each handler.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PinCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PinCodeError {
    /// The input is not exactly six characters after trimming.
    #[error("PIN code must be exactly six digits")]
    WrongLength,
    /// The input contains a non-digit character.
    #[error("PIN code must contain only digits")]
    NotDigits,
    /// PIN codes never start with zero.
    #[error("PIN code cannot start with zero")]
    LeadingZero,
}

/// A six-digit Indian postal PIN code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PinCode(String);

impl PinCode {
    /// Parse a `PinCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns a [`PinCodeError`] describing the first failed constraint.
    pub fn parse(s: &str) -> Result<Self, PinCodeError> {
        let s = s.trim();
        if s.len() != 6 {
            return Err(PinCodeError::WrongLength);
        }
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinCodeError::NotDigits);
        }
        if s.starts_with('0') {
            return Err(PinCodeError::LeadingZero);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the PIN code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PinCode {
    type Err = PinCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PinCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PinCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PinCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(PinCode::parse("110001").unwrap().as_str(), "110001");
        assert_eq!(PinCode::parse(" 560034 ").unwrap().as_str(), "560034");
    }

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(PinCode::parse("11000"), Err(PinCodeError::WrongLength));
        assert_eq!(PinCode::parse("1100011"), Err(PinCodeError::WrongLength));
        assert_eq!(PinCode::parse("11000a"), Err(PinCodeError::NotDigits));
        assert_eq!(PinCode::parse("010001"), Err(PinCodeError::LeadingZero));
    }
}
