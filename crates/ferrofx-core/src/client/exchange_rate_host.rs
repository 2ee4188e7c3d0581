use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use time::{Date, OffsetDateTime};

use super::{fetch_json, json_decimal, RateMap, SymbolRatesClient};
use crate::config::ProviderConfig;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::{ProviderId, RateError};

pub const DEFAULT_BASE_URI: &str = "https://api.exchangerate.host";

const PROVIDER: ProviderId = ProviderId::ExchangeRateHost;

/// exchangerate.host client.
///
/// Requests for the current day go to `/live`, every other date to
/// `/historical`. Quote keys in responses are base-prefixed (`USDEUR`).
#[derive(Clone)]
pub struct ExchangeRateHostClient {
    http: Arc<dyn HttpClient>,
    base_uri: String,
    access_key: Option<String>,
    timeout: Duration,
    retry: RetryConfig,
    today: fn() -> Date,
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    quotes: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    info: Option<Value>,
    #[serde(default)]
    code: Option<Value>,
}

fn utc_today() -> Date {
    OffsetDateTime::now_utc().date()
}

impl ExchangeRateHostClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            base_uri: String::from(DEFAULT_BASE_URI),
            access_key: None,
            timeout: Duration::from_secs(10),
            retry: RetryConfig::from_attempts(1, Duration::from_millis(100)),
            today: utc_today,
        }
    }

    pub fn from_config(config: &ProviderConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_uri: config.base_uri_or(DEFAULT_BASE_URI),
            access_key: config
                .access_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned),
            timeout: config.timeout(),
            retry: config.retry(),
            ..Self::new(http)
        }
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the clock used to pick between the live and historical
    /// endpoints.
    pub fn with_today(mut self, today: fn() -> Date) -> Self {
        self.today = today;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_uri.trim_end_matches('/'), path)
    }

    fn build_request(&self, base: &str, quotes: &[String], date: Date) -> HttpRequest {
        let mut request = if date == (self.today)() {
            HttpRequest::get(self.endpoint("live"))
        } else {
            HttpRequest::get(self.endpoint("historical")).with_query("date", iso_date(date))
        };
        request = request.with_query("source", base);

        if let Some(access_key) = &self.access_key {
            request = request.with_query("access_key", access_key.as_str());
        }
        if !quotes.is_empty() {
            request = request.with_query("currencies", quotes.join(","));
        }

        request.with_timeout(self.timeout)
    }

    async fn fetch(&self, base: &str, quotes: &[String], date: Date) -> Result<RateMap, RateError> {
        let request = self.build_request(base, quotes, date);
        let payload: QuotesResponse =
            fetch_json(self.http.as_ref(), PROVIDER, request, &self.retry).await?;

        if payload.success != Some(true) {
            let error = payload.error.unwrap_or_default();
            let info = render_field(error.info, "Unknown error");
            let code = render_field(error.code, "unknown");

            return Err(RateError::invalid_response(
                PROVIDER,
                format!("API returned error: {info} (code: {code})"),
            ));
        }

        let Some(Value::Object(pairs)) = payload.quotes else {
            return Err(RateError::invalid_response(
                PROVIDER,
                "Missing or invalid \"quotes\" field in response",
            ));
        };

        let prefix = base.trim().to_ascii_uppercase();
        let mut rates = RateMap::new();

        for (pair, value) in &pairs {
            let pair = pair.to_ascii_uppercase();
            let Some(quote) = pair.strip_prefix(&prefix).filter(|code| !code.is_empty()) else {
                continue;
            };

            let rate = json_decimal(value).ok_or_else(|| {
                RateError::invalid_response(
                    PROVIDER,
                    format!("quote {pair} is not a number: {value}"),
                )
            })?;
            rates.insert(quote.to_owned(), rate);
        }

        Ok(rates)
    }
}

impl SymbolRatesClient for ExchangeRateHostClient {
    fn provider(&self) -> ProviderId {
        PROVIDER
    }

    fn get_rates<'a>(
        &'a self,
        base: &'a str,
        quotes: &'a [String],
        date: Date,
    ) -> Pin<Box<dyn Future<Output = Result<RateMap, RateError>> + Send + 'a>> {
        Box::pin(self.fetch(base, quotes, date))
    }
}

/// Text of an error field the provider may send as a string, a number or an
/// object; absent or null falls back to `default`.
fn render_field(value: Option<Value>, default: &str) -> String {
    match value {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => default.to_owned(),
        Some(other) => other.to_string(),
    }
}

fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
