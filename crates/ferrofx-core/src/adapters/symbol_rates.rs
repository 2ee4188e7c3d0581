use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::{assemble, require_fiat, RateAdapter, RateLookup, RateRequest};
use crate::client::{CurrencyFreaksClient, ExchangeRateHostClient, SymbolRatesClient};
use crate::config::ProviderConfig;
use crate::error::CurrencyRole;
use crate::http_client::HttpClient;
use crate::{
    ConfigError, Currency, CurrencyMetadata, CurrencyRate, ProviderId, RateError,
    UNKNOWN_NUMERIC_CODE,
};

/// Adapter over a symbol-based REST client.
///
/// Providers in this family publish a bare rate per code, so every rate is
/// already per unit (nominal 1). Names and numeric codes come from the
/// optional metadata table and default to the code and `000`.
#[derive(Clone)]
pub struct SymbolRatesAdapter<C> {
    client: C,
    metadata: Option<Arc<dyn CurrencyMetadata>>,
}

pub type CurrencyFreaksAdapter = SymbolRatesAdapter<CurrencyFreaksClient>;
pub type ExchangeRateHostAdapter = SymbolRatesAdapter<ExchangeRateHostClient>;

impl<C: SymbolRatesClient> SymbolRatesAdapter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn CurrencyMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn fetch(&self, request: &RateRequest) -> Result<RateLookup, RateError> {
        let provider = self.client.provider();
        let base = require_fiat(&request.base, provider, CurrencyRole::Base)?;
        let quotes = request
            .quotes
            .currencies()
            .iter()
            .map(|quote| {
                require_fiat(quote, provider, CurrencyRole::Quote).map(|code| code.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let published = self
            .client
            .get_rates(base.as_str(), &quotes, request.date)
            .await?;

        let found = request
            .quotes
            .currencies()
            .iter()
            .zip(&quotes)
            .filter_map(|(currency, code)| {
                published
                    .get(code)
                    .map(|rate| self.make_rate(currency.clone(), code, *rate))
            })
            .collect();

        assemble(request, found)
    }

    fn make_rate(&self, currency: Currency, code: &str, rate: Decimal) -> CurrencyRate {
        let info = self.metadata.as_ref().and_then(|metadata| metadata.lookup(code));
        let (name, numeric_code) = match info {
            Some(info) => (info.name, info.numeric_code),
            None => (code.to_owned(), String::from(UNKNOWN_NUMERIC_CODE)),
        };

        CurrencyRate::new(currency, name, numeric_code, rate)
            .with_unit_rate(Some(rate))
            .with_nominal(Some(1))
    }
}

impl CurrencyFreaksAdapter {
    pub fn from_config(
        config: &ProviderConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        CurrencyFreaksClient::from_config(config, http).map(Self::new)
    }
}

impl ExchangeRateHostAdapter {
    pub fn from_config(config: &ProviderConfig, http: Arc<dyn HttpClient>) -> Self {
        Self::new(ExchangeRateHostClient::from_config(config, http))
    }
}

impl<C: SymbolRatesClient> RateAdapter for SymbolRatesAdapter<C> {
    fn provider(&self) -> ProviderId {
        self.client.provider()
    }

    fn rates<'a>(
        &'a self,
        request: &'a RateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateLookup, RateError>> + Send + 'a>> {
        Box::pin(self.fetch(request))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::*;
    use crate::http_client::ScriptedHttpClient;
    use crate::retry::RetryConfig;
    use crate::{RateErrorKind, StaticCurrencyMetadata, ValidationError};

    fn fiat(code: &str) -> Currency {
        Currency::fiat(code).expect("valid code")
    }

    fn freaks(http: &Arc<ScriptedHttpClient>) -> CurrencyFreaksAdapter {
        CurrencyFreaksAdapter::new(
            CurrencyFreaksClient::new(http.clone(), "key").with_retry(RetryConfig::no_retry()),
        )
    }

    #[tokio::test]
    async fn synthesizes_name_and_numeric_code() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(r#"{"rates":{"EUR":"0.9134"}}"#));
        let request = RateRequest::single(fiat("USD"), fiat("EUR"), date!(2024 - 01 - 10));

        let rate = freaks(&http)
            .rates(&request)
            .await
            .unwrap()
            .into_single()
            .unwrap();

        assert_eq!(rate.name, "EUR");
        assert_eq!(rate.numeric_code, "000");
        assert_eq!(rate.nominal, Some(1));
        assert_eq!(rate.unit_rate, Some(dec!(0.9134)));
        assert_eq!(rate.per_unit(), dec!(0.9134));
    }

    #[tokio::test]
    async fn metadata_enriches_rates() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(r#"{"rates":{"EUR":0.91}}"#));
        let adapter = freaks(&http).with_metadata(Arc::new(StaticCurrencyMetadata::common()));
        let request = RateRequest::single(fiat("USD"), fiat("EUR"), date!(2024 - 01 - 10));

        let rate = adapter.rates(&request).await.unwrap().into_single().unwrap();

        assert_eq!(rate.name, "Euro");
        assert_eq!(rate.numeric_code, "978");
    }

    #[tokio::test]
    async fn partial_list_omits_missing_quotes() {
        let http = Arc::new(
            ScriptedHttpClient::new().respond_ok(r#"{"rates":{"GBP":"0.78","EUR":"0.91"}}"#),
        );
        let request = RateRequest::many(
            fiat("USD"),
            vec![fiat("EUR"), fiat("JPY"), fiat("GBP")],
            date!(2024 - 01 - 10),
        )
        .unwrap();

        let lookup = freaks(&http).rates(&request).await.unwrap();
        let codes: Vec<String> = lookup.rates().iter().map(|r| r.currency.code()).collect();

        assert_eq!(codes, vec!["EUR", "GBP"]);
    }

    #[tokio::test]
    async fn missing_single_quote_is_not_found() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(r#"{"rates":{}}"#));
        let request = RateRequest::single(fiat("USD"), fiat("JPY"), date!(2024 - 01 - 10));

        let error = freaks(&http).rates(&request).await.unwrap_err();
        assert_eq!(error.kind(), RateErrorKind::CurrencyNotFound);
    }

    #[tokio::test]
    async fn crypto_is_rejected_without_network_call() {
        let http = Arc::new(ScriptedHttpClient::new());
        let request = RateRequest::single(
            fiat("USD"),
            Currency::crypto("USDT", Some("tron")).unwrap(),
            date!(2024 - 01 - 10),
        );

        let error = freaks(&http).rates(&request).await.unwrap_err();

        assert!(matches!(
            error,
            RateError::Validation(ValidationError::CryptoNotSupported {
                provider: ProviderId::CurrencyFreaks,
                role: CurrencyRole::Quote,
            })
        ));
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn exchange_rate_host_adapter_reports_its_provider() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(
            r#"{"success":true,"quotes":{"EURUSD":1.0946}}"#,
        ));
        let adapter = ExchangeRateHostAdapter::new(
            ExchangeRateHostClient::new(http.clone()).with_retry(RetryConfig::no_retry()),
        );
        let request = RateRequest::single(fiat("EUR"), fiat("USD"), date!(2023 - 06 - 01));

        let rate = adapter.rates(&request).await.unwrap().into_single().unwrap();

        assert_eq!(adapter.provider(), ProviderId::ExchangeRateHost);
        assert_eq!(rate.rate, dec!(1.0946));
    }
}
