//! Money amounts using decimal arithmetic.
//!
//! Prices are currency-tagged decimals in the currency's standard unit
//! (rupees, not paise). Conversion to minor units happens only at the
//! payment-gateway edge.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A money amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create an INR price.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Line total for `quantity` units at this unit price.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.amount * Decimal::from(quantity)
    }

    /// Amount in minor units (paise for INR), rounded to two decimal places.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        (self.amount.round_dp(2) * Decimal::ONE_HUNDRED).to_i64()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "\u{20b9}",
            Self::USD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }

    /// ISO 4217 alphabetic code, as sent to the payment gateway.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let price = Price::inr(Decimal::new(49950, 2));
        assert_eq!(price.line_total(3), Decimal::new(149850, 2));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Price::inr(Decimal::from(550)).minor_units(), Some(55_000));
        assert_eq!(Price::inr(Decimal::new(1, 2)).minor_units(), Some(1));
        // Sub-paise amounts round to the nearest paise
        assert_eq!(Price::inr(Decimal::new(1005, 3)).minor_units(), Some(100));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::inr(Decimal::from(550)).to_string(), "\u{20b9}550.00");
    }
}
