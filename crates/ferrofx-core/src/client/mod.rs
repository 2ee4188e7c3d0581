//! Protocol clients: the SOAP client for the central bank and the REST clients
//! for symbol-based providers.

pub mod cbr;
pub mod currency_freaks;
pub mod dto;
pub mod exchange_rate_host;
pub mod soap;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use time::Date;

use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::{send_with_retry, RetryConfig};
use crate::{ProviderId, RateError};

pub use cbr::CbrSoapClient;
pub use currency_freaks::CurrencyFreaksClient;
pub use dto::{
    CurrencyDictionaryEntry, CurrencyDictionarySnapshot, RateRow, RatesOnDateSnapshot,
};
pub use exchange_rate_host::ExchangeRateHostClient;

/// Quote code to rate, as published by a symbol-based provider.
pub type RateMap = BTreeMap<String, Decimal>;

/// Fetches rates of `quotes` against `base` from a REST provider.
pub trait SymbolRatesClient: Send + Sync {
    fn provider(&self) -> ProviderId;

    fn get_rates<'a>(
        &'a self,
        base: &'a str,
        quotes: &'a [String],
        date: Date,
    ) -> Pin<Box<dyn Future<Output = Result<RateMap, RateError>> + Send + 'a>>;
}

/// Sends `request` with retry and decodes a successful JSON body into `T`.
///
/// Transport failures and non-2xx statuses keep their distinct error kinds.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
    retry: &RetryConfig,
) -> Result<T, RateError> {
    tracing::debug!(provider = %provider, url = %request.url, "requesting rates");

    let response = send_with_retry(http, request, retry)
        .await
        .map_err(|error| RateError::from_transport(provider, error))?;

    if !response.is_success() {
        return Err(RateError::from_status(provider, response.status));
    }

    serde_json::from_str(&response.body).map_err(|error| {
        RateError::invalid_response_with(provider, "response body is not valid JSON", error)
    })
}

/// Reads a rate given either as a JSON number or as a numeric string.
pub(crate) fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(number) => dto::parse_decimal(&number.to_string()),
        serde_json::Value::String(text) => dto::parse_decimal(text),
        _ => None,
    }
}
