use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use super::conversion;
use crate::{Currency, RateError, ValidationError};

/// Numeric code used when a provider does not publish one.
pub const UNKNOWN_NUMERIC_CODE: &str = "000";

/// One published exchange rate.
///
/// `rate` is the raw provider value for `nominal` units of the currency;
/// `unit_rate`, when the provider publishes it, is already per single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub currency: Currency,
    pub name: String,
    pub numeric_code: String,
    pub rate: Decimal,
    pub unit_rate: Option<Decimal>,
    pub nominal: Option<u32>,
}

impl CurrencyRate {
    pub fn new(
        currency: Currency,
        name: impl Into<String>,
        numeric_code: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        let numeric_code = numeric_code.into();
        let numeric_code = if numeric_code.trim().is_empty() {
            String::from(UNKNOWN_NUMERIC_CODE)
        } else {
            numeric_code
        };

        Self {
            currency,
            name: name.into(),
            numeric_code,
            rate,
            unit_rate: None,
            nominal: None,
        }
    }

    pub fn with_unit_rate(mut self, unit_rate: Option<Decimal>) -> Self {
        self.unit_rate = unit_rate;
        self
    }

    pub fn with_nominal(mut self, nominal: Option<u32>) -> Self {
        self.nominal = nominal;
        self
    }

    /// Whether [`per_unit`](Self::per_unit) is an actual per-unit value rather
    /// than the raw rate shown as a fallback.
    pub fn is_per_unit_determined(&self) -> bool {
        self.unit_rate.is_some() || matches!(self.nominal, Some(n) if n != 0)
    }

    /// Value of one unit of the currency in the provider's base currency.
    ///
    /// Without a unit rate and with a missing or zero nominal the raw rate is
    /// returned unchanged.
    pub fn per_unit(&self) -> Decimal {
        if let Some(unit_rate) = self.unit_rate {
            return unit_rate;
        }

        match self.nominal {
            Some(nominal) if nominal != 0 => self
                .rate
                .checked_div(Decimal::from(nominal))
                .unwrap_or(self.rate),
            _ => self.rate,
        }
    }

    /// Converts `amount` units at the per-unit value.
    pub fn convert(&self, amount: Decimal) -> Result<Decimal, ValidationError> {
        conversion::multiply(self.per_unit(), amount)
    }
}

/// All rates a provider published for one date, indexed by currency code.
#[derive(Debug, Clone, PartialEq)]
pub struct RatesOnDate {
    date: Date,
    rates: Vec<CurrencyRate>,
    index: HashMap<String, usize>,
}

impl RatesOnDate {
    /// A later entry for the same code replaces an earlier one in the index.
    pub fn new(date: Date, rates: Vec<CurrencyRate>) -> Self {
        let index = rates
            .iter()
            .enumerate()
            .map(|(position, rate)| (index_key(&rate.currency.code()), position))
            .collect();

        Self { date, rates, index }
    }

    pub const fn date(&self) -> Date {
        self.date
    }

    pub fn rates(&self) -> &[CurrencyRate] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Case-insensitive lookup by code.
    pub fn find(&self, code: &str) -> Option<&CurrencyRate> {
        self.index
            .get(&index_key(code))
            .and_then(|position| self.rates.get(*position))
    }

    pub fn get(&self, code: &str) -> Result<&CurrencyRate, RateError> {
        self.find(code)
            .ok_or_else(|| RateError::currency_not_found(index_key(code)))
    }

    /// Rates for `quotes` in request order; codes absent from the snapshot are
    /// skipped.
    pub fn select(&self, quotes: &[Currency]) -> Vec<CurrencyRate> {
        quotes
            .iter()
            .filter_map(|quote| self.find(&quote.code()))
            .cloned()
            .collect()
    }
}

fn index_key(code: &str) -> String {
    code.trim().to_uppercase()
}
