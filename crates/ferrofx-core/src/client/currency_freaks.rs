use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use time::Date;

use super::{fetch_json, json_decimal, RateMap, SymbolRatesClient};
use crate::config::ProviderConfig;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::{ConfigError, ProviderId, RateError};

pub const DEFAULT_BASE_URI: &str = "https://api.currencyfreaks.com/v2.0/rates/latest";

const PROVIDER: ProviderId = ProviderId::CurrencyFreaks;

/// CurrencyFreaks latest-rates API. Requires an API key.
///
/// The service only publishes latest rates, so the requested date is not sent.
#[derive(Clone)]
pub struct CurrencyFreaksClient {
    http: Arc<dyn HttpClient>,
    base_uri: String,
    api_key: String,
    timeout: Duration,
    retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: Option<Value>,
}

impl CurrencyFreaksClient {
    pub fn new(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_uri: String::from(DEFAULT_BASE_URI),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::from_attempts(1, Duration::from_millis(100)),
        }
    }

    pub fn from_config(
        config: &ProviderConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSetting {
                provider: PROVIDER,
                setting: "api_key",
            })?;

        Ok(Self {
            http,
            base_uri: config.base_uri_or(DEFAULT_BASE_URI),
            api_key: api_key.to_owned(),
            timeout: config.timeout(),
            retry: config.retry(),
        })
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> &str {
        self.base_uri.trim_end_matches('/')
    }

    async fn fetch(&self, base: &str, quotes: &[String]) -> Result<RateMap, RateError> {
        let request = HttpRequest::get(self.endpoint())
            .with_query("base", base)
            .with_query("symbols", quotes.join(","))
            .with_query("apikey", self.api_key.as_str())
            .with_timeout(self.timeout);

        let payload: LatestRatesResponse =
            fetch_json(self.http.as_ref(), PROVIDER, request, &self.retry).await?;

        let Some(Value::Object(rates)) = payload.rates else {
            return Err(RateError::invalid_response(
                PROVIDER,
                "Missing or invalid \"rates\" field in response",
            ));
        };

        rates
            .iter()
            .map(|(code, value)| {
                json_decimal(value)
                    .map(|rate| (code.trim().to_ascii_uppercase(), rate))
                    .ok_or_else(|| {
                        RateError::invalid_response(
                            PROVIDER,
                            format!("rate for {code} is not a number: {value}"),
                        )
                    })
            })
            .collect()
    }
}

impl SymbolRatesClient for CurrencyFreaksClient {
    fn provider(&self) -> ProviderId {
        PROVIDER
    }

    fn get_rates<'a>(
        &'a self,
        base: &'a str,
        quotes: &'a [String],
        _date: Date,
    ) -> Pin<Box<dyn Future<Output = Result<RateMap, RateError>> + Send + 'a>> {
        Box::pin(self.fetch(base, quotes))
    }
}
