use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rust_decimal::Decimal;
use time::Date;

use super::{QuoteSelection, RateAdapter, RateLookup, RateRequest};
use crate::{Currency, CurrencyRate, ProviderId, RateError, UNKNOWN_NUMERIC_CODE};

/// In-memory adapter serving preset rates, for tests and offline demos.
///
/// Rates are keyed by date, base and the sorted quote codes, so a list
/// registered as `[EUR, USD]` also answers `[USD, EUR]`, in the order asked
/// for. Every call to [`RateAdapter::rates`] is counted.
#[derive(Debug, Default)]
pub struct FakeRatesAdapter {
    rates: Mutex<HashMap<String, RateLookup>>,
    fetches: AtomicUsize,
}

impl FakeRatesAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the answer for `base`/`quotes` on `date`.
    pub fn set_rate(&self, base: Currency, quotes: QuoteSelection, date: Date, lookup: RateLookup) {
        let key = RateRequest {
            base,
            quotes,
            date,
        }
        .key_fragment();

        self.rates
            .lock()
            .expect("fake rate table is not poisoned")
            .insert(key, lookup);
    }

    /// Registers a per-unit rate for a single quote.
    pub fn set_rate_value(&self, base: Currency, quote: Currency, date: Date, value: Decimal) {
        let rate = unit_rate(quote.clone(), value);
        self.set_rate(base, QuoteSelection::Single(quote), date, RateLookup::Single(rate));
    }

    /// Registers per-unit rates for a quote list, in the given order.
    pub fn set_rate_values(&self, base: Currency, quotes: Vec<(Currency, Decimal)>, date: Date) {
        let rates = quotes
            .iter()
            .map(|(quote, value)| unit_rate(quote.clone(), *value))
            .collect();
        let selection = QuoteSelection::Many(quotes.into_iter().map(|(quote, _)| quote).collect());

        self.set_rate(base, selection, date, RateLookup::Many(rates));
    }

    pub fn clear(&self) {
        self.rates
            .lock()
            .expect("fake rate table is not poisoned")
            .clear();
    }

    /// Number of `rates` calls served so far, including failed lookups.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, request: &RateRequest) -> Result<RateLookup, RateError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let stored = self
            .rates
            .lock()
            .expect("fake rate table is not poisoned")
            .get(&request.key_fragment())
            .cloned();

        let stored = stored.map(|lookup| lookup.ordered_for(&request.quotes));

        stored.ok_or_else(|| {
            let quotes = request
                .quotes
                .currencies()
                .iter()
                .map(Currency::code)
                .collect::<Vec<_>>()
                .join(",");

            RateError::invalid_response(
                ProviderId::Fake,
                format!(
                    "no fake rate set for base={}, quote={}, date={}",
                    request.base, quotes, request.date
                ),
            )
        })
    }
}

impl RateAdapter for FakeRatesAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Fake
    }

    fn rates<'a>(
        &'a self,
        request: &'a RateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateLookup, RateError>> + Send + 'a>> {
        let result = self.lookup(request);
        Box::pin(async move { result })
    }
}

fn unit_rate(currency: Currency, value: Decimal) -> CurrencyRate {
    let code = currency.code();
    CurrencyRate::new(currency, code, UNKNOWN_NUMERIC_CODE, value)
        .with_unit_rate(Some(value))
        .with_nominal(Some(1))
}
