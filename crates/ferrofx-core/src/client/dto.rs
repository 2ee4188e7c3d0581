//! Raw provider payloads.
//!
//! Protocol clients produce these and adapters consume them right away; they
//! never leave the provider layer.

use rust_decimal::Decimal;
use time::Date;

/// One row of a published rate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRow {
    pub name: String,
    pub nominal: u32,
    pub rate: Decimal,
    pub numeric_code: String,
    pub char_code: String,
    pub unit_rate: Option<Decimal>,
}

/// Full rate table for one publication date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatesOnDateSnapshot {
    pub on_date: Date,
    pub rates: Vec<RateRow>,
}

/// Entry of the provider currency dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyDictionaryEntry {
    pub internal_code: String,
    pub name: String,
    pub english_name: String,
    pub nominal: u32,
    pub common_code: Option<String>,
    pub numeric_code: Option<String>,
    pub char_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CurrencyDictionarySnapshot {
    pub items: Vec<CurrencyDictionaryEntry>,
}

impl CurrencyDictionarySnapshot {
    /// Entry carrying the given ISO letter code, if any.
    pub fn by_char_code(&self, code: &str) -> Option<&CurrencyDictionaryEntry> {
        let code = code.trim();
        self.items.iter().find(|item| {
            item.char_code
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(code))
        })
    }
}

/// Parses a provider decimal, accepting a comma as the decimal separator.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }

    normalized
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&normalized).ok())
}
