//! Mobile phone number type.
//!
//! OTP dispatch and cash-on-delivery contact both key on a phone number, so
//! the stored form must be canonical: ten digits, no country prefix. Parsing
//! accepts the spellings users actually type (`+91 98765 43210`,
//! `098765-43210`, `9876543210`) and normalizes them all to the same value.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty after stripping separators.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a character that is not a digit, separator, or
    /// leading `+`.
    #[error("phone number contains invalid characters")]
    InvalidCharacter,
    /// After prefix stripping the number is not exactly ten digits.
    #[error("phone number must be ten digits, got {got}")]
    WrongLength {
        /// Digit count after normalization.
        got: usize,
    },
    /// Indian mobile numbers start with 6-9.
    #[error("not a valid mobile number")]
    NotMobile,
}

/// A normalized ten-digit Indian mobile number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a `Phone` from a string.
    ///
    /// Accepts an optional `+91`/`91` country prefix or a single leading `0`,
    /// with spaces and dashes anywhere.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] describing the first failed constraint.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacter);
        }

        let digits = if digits.len() == 12 {
            digits.strip_prefix("91").unwrap_or(digits)
        } else if digits.len() == 11 {
            digits.strip_prefix('0').unwrap_or(digits)
        } else {
            digits
        };

        if digits.len() != 10 {
            return Err(PhoneError::WrongLength { got: digits.len() });
        }
        if !digits.starts_with(['6', '7', '8', '9']) {
            return Err(PhoneError::NotMobile);
        }

        Ok(Self(digits.to_owned()))
    }

    /// Returns the ten-digit number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number in E.164 form, as sent to the SMS provider.
    #[must_use]
    pub fn e164(&self) -> String {
        format!("+91{}", self.0)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Phone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Phone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Phone {
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
    fn test_spellings_normalize_to_same_value() {
        let canonical = Phone::parse("9876543210").unwrap();
        for spelling in [
            "+91 98765 43210",
            "91-98765-43210",
            "098765 43210",
            " 98765 43210 ",
        ] {
            assert_eq!(Phone::parse(spelling).unwrap(), canonical, "{spelling}");
        }
    }

    #[test]
    fn test_e164() {
        let phone = Phone::parse("9876543210").unwrap();
        assert_eq!(phone.e164(), "+919876543210");
    }

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(Phone::parse("  "), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("98765abc10"), Err(PhoneError::InvalidCharacter));
        assert_eq!(
            Phone::parse("12345"),
            Err(PhoneError::WrongLength { got: 5 })
        );
        assert_eq!(Phone::parse("1234567890"), Err(PhoneError::NotMobile));
    }

    #[test]
    fn test_landline_style_prefix_rejected() {
        // 11 digits that do not start with 0 cannot be normalized
        assert!(matches!(
            Phone::parse("19876543210"),
            Err(PhoneError::WrongLength { got: 11 })
        ));
    }
}
