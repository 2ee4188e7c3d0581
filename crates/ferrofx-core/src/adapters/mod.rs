//! # Provider Adapters
//!
//! Each adapter wraps one protocol client, rejects requests the provider
//! cannot serve before any network call, and maps raw payloads into
//! [`CurrencyRate`] values.
//!
//! | Adapter | Provider | Base currency | Crypto |
//! |---------|----------|---------------|--------|
//! | [`CbrAdapter`] | Central Bank of Russia (SOAP) | RUB only | no |
//! | [`CurrencyFreaksAdapter`] | CurrencyFreaks (REST) | any fiat | no |
//! | [`ExchangeRateHostAdapter`] | exchangerate.host (REST) | any fiat | no |
//! | [`FakeRatesAdapter`] | in-memory fixtures | any | yes |
//!
//! The output shape follows the request: a single quote yields
//! [`RateLookup::Single`], a list yields [`RateLookup::Many`] in request
//! order. Quotes missing from a provider response are left out of a list;
//! a missing single quote is [`RateError::CurrencyNotFound`].

mod cbr;
mod fake;
mod symbol_rates;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use time::Date;

pub use cbr::CbrAdapter;
pub use fake::FakeRatesAdapter;
pub use symbol_rates::{CurrencyFreaksAdapter, ExchangeRateHostAdapter, SymbolRatesAdapter};

use crate::error::CurrencyRole;
use crate::{Currency, CurrencyCode, CurrencyRate, ProviderId, RateError, ValidationError};

/// Quote side of a request: one currency or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteSelection {
    Single(Currency),
    Many(Vec<Currency>),
}

impl QuoteSelection {
    pub fn currencies(&self) -> &[Currency] {
        match self {
            Self::Single(currency) => std::slice::from_ref(currency),
            Self::Many(currencies) => currencies,
        }
    }

    pub const fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }
}

/// Rates of one or more quote currencies against `base` on `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    pub base: Currency,
    pub quotes: QuoteSelection,
    pub date: Date,
}

impl RateRequest {
    pub fn single(base: Currency, quote: Currency, date: Date) -> Self {
        Self {
            base,
            quotes: QuoteSelection::Single(quote),
            date,
        }
    }

    pub fn many(base: Currency, quotes: Vec<Currency>, date: Date) -> Result<Self, ValidationError> {
        if quotes.is_empty() {
            return Err(ValidationError::EmptyQuoteList);
        }

        Ok(Self {
            base,
            quotes: QuoteSelection::Many(quotes),
            date,
        })
    }

    /// `YYYYMMDD_BASE_Q1-Q2`, with quote codes sorted so list order does not
    /// change the fragment.
    pub fn key_fragment(&self) -> String {
        let mut quotes: Vec<String> = self
            .quotes
            .currencies()
            .iter()
            .map(Currency::code)
            .collect();
        quotes.sort();

        format!(
            "{:04}{:02}{:02}_{}_{}",
            self.date.year(),
            u8::from(self.date.month()),
            self.date.day(),
            self.base.code(),
            quotes.join("-")
        )
    }
}

/// Adapter output; mirrors the shape of [`QuoteSelection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLookup {
    Single(CurrencyRate),
    Many(Vec<CurrencyRate>),
}

impl RateLookup {
    pub fn rates(&self) -> &[CurrencyRate] {
        match self {
            Self::Single(rate) => std::slice::from_ref(rate),
            Self::Many(rates) => rates,
        }
    }

    pub fn into_single(self) -> Option<CurrencyRate> {
        match self {
            Self::Single(rate) => Some(rate),
            Self::Many(_) => None,
        }
    }

    pub fn into_rates(self) -> Vec<CurrencyRate> {
        match self {
            Self::Single(rate) => vec![rate],
            Self::Many(rates) => rates,
        }
    }

    /// Reorders a list to follow `quotes`; rates for other currencies are
    /// dropped. Single lookups are returned unchanged.
    pub fn ordered_for(self, quotes: &QuoteSelection) -> Self {
        match (self, quotes) {
            (Self::Many(rates), QuoteSelection::Many(quotes)) => Self::Many(
                quotes
                    .iter()
                    .filter_map(|quote| rates.iter().find(|rate| rate.currency == *quote).cloned())
                    .collect(),
            ),
            (lookup, _) => lookup,
        }
    }

    /// Answers `quotes` from this lookup when it holds the same currencies in
    /// either shape. A single rate can come from a list that contains it, a
    /// one-element list from a single rate. `None` when the quote is absent.
    pub fn reshaped_for(self, quotes: &QuoteSelection) -> Option<Self> {
        match (self, quotes) {
            (Self::Single(rate), QuoteSelection::Single(quote)) => {
                (rate.currency == *quote).then_some(Self::Single(rate))
            }
            (Self::Many(rates), QuoteSelection::Single(quote)) => rates
                .into_iter()
                .find(|rate| rate.currency == *quote)
                .map(Self::Single),
            (Self::Single(rate), QuoteSelection::Many(_)) => {
                Some(Self::Many(vec![rate]).ordered_for(quotes))
            }
            (lookup @ Self::Many(_), QuoteSelection::Many(_)) => Some(lookup.ordered_for(quotes)),
        }
    }
}

/// Provider adapter contract.
pub trait RateAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    fn rates<'a>(
        &'a self,
        request: &'a RateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateLookup, RateError>> + Send + 'a>>;
}

/// Rejects crypto currencies for providers keyed by ISO codes.
pub(crate) fn require_fiat(
    currency: &Currency,
    provider: ProviderId,
    role: CurrencyRole,
) -> Result<&CurrencyCode, ValidationError> {
    currency
        .as_fiat()
        .ok_or(ValidationError::CryptoNotSupported { provider, role })
}

/// Shapes the rates found for `request` into a lookup.
pub(crate) fn assemble(
    request: &RateRequest,
    mut found: Vec<CurrencyRate>,
) -> Result<RateLookup, RateError> {
    match &request.quotes {
        QuoteSelection::Single(quote) => {
            if found.is_empty() {
                Err(RateError::currency_not_found(quote.code()))
            } else {
                Ok(RateLookup::Single(found.swap_remove(0)))
            }
        }
        QuoteSelection::Many(_) => Ok(RateLookup::Many(found)),
    }
}
