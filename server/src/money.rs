use iso_currency::Currency;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("amount must be positive, got {0}")]
    NotPositive(Decimal),
}

/// The single currency a campaign collects in, with the symbol used when
/// displaying amounts.
#[derive(Clone, Debug)]
pub struct CurrencyUnit {
    currency: Currency,
    symbol: String,
}

impl CurrencyUnit {
    pub fn new(currency: Currency, symbol: Option<String>) -> Self {
        let symbol = symbol.unwrap_or_else(|| currency.code().to_string());
        Self { currency, symbol }
    }

    /// Number of digits after the decimal point, derived from the subunit
    /// fraction (100 cents per dollar gives 2).
    pub fn decimal_places(&self) -> u32 {
        self.currency
            .subunit_fraction()
            .map(|fraction| fraction.ilog10())
            .unwrap_or(0)
    }

    pub fn format(&self, amount: Decimal) -> String {
        format!(
            "{:.*} {}",
            self.decimal_places() as usize,
            amount,
            self.symbol
        )
    }

    /// Parses a user-typed amount. Both `.` and `,` are accepted as decimal
    /// separator and the value is rounded to the currency's subunit.
    pub fn parse_amount(&self, input: &str) -> Result<Decimal, AmountError> {
        let trimmed = input.trim();
        let amount = Decimal::from_str(&trimmed.replace(',', "."))
            .map_err(|_| AmountError::NotANumber(trimmed.to_string()))?
            .round_dp_with_strategy(
                self.decimal_places(),
                RoundingStrategy::MidpointAwayFromZero,
            );
        if amount <= Decimal::ZERO {
            return Err(AmountError::NotPositive(amount));
        }
        Ok(amount.normalize())
    }
}
