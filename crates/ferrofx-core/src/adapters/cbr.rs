use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use time::{Date, OffsetDateTime};

use super::{assemble, require_fiat, QuoteSelection, RateAdapter, RateLookup, RateRequest};
use crate::client::{CbrSoapClient, CurrencyDictionarySnapshot, RateRow, RatesOnDateSnapshot};
use crate::config::ProviderConfig;
use crate::error::CurrencyRole;
use crate::http_client::HttpClient;
use crate::{Currency, CurrencyRate, ProviderId, RateError, RatesOnDate, ValidationError};

const PROVIDER: ProviderId = ProviderId::Cbr;
const NATIVE_CURRENCY: &str = "RUB";

/// Central Bank of Russia adapter. Rates are always quoted against RUB.
#[derive(Clone)]
pub struct CbrAdapter {
    client: CbrSoapClient,
}

impl CbrAdapter {
    pub fn new(client: CbrSoapClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ProviderConfig, http: Arc<dyn HttpClient>) -> Self {
        Self::new(CbrSoapClient::from_config(config, http))
    }

    pub fn client(&self) -> &CbrSoapClient {
        &self.client
    }

    /// Every rate published for `date`.
    pub async fn snapshot(&self, date: Date) -> Result<RatesOnDate, RateError> {
        let snapshot = self.client.rates_on_date(date).await?;
        map_snapshot(snapshot)
    }

    pub async fn currencies(&self, monthly: bool) -> Result<CurrencyDictionarySnapshot, RateError> {
        self.client.enum_currencies(monthly).await
    }

    pub async fn latest_publication_time(&self) -> Result<OffsetDateTime, RateError> {
        self.client.latest_publication_time().await
    }

    async fn fetch(&self, request: &RateRequest) -> Result<RateLookup, RateError> {
        validate(request)?;

        let rates = self.snapshot(request.date).await?;
        match &request.quotes {
            QuoteSelection::Single(quote) => Ok(RateLookup::Single(rates.get(&quote.code())?.clone())),
            QuoteSelection::Many(quotes) => assemble(request, rates.select(quotes)),
        }
    }
}

impl RateAdapter for CbrAdapter {
    fn provider(&self) -> ProviderId {
        PROVIDER
    }

    fn rates<'a>(
        &'a self,
        request: &'a RateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateLookup, RateError>> + Send + 'a>> {
        Box::pin(self.fetch(request))
    }
}

fn validate(request: &RateRequest) -> Result<(), ValidationError> {
    let base = require_fiat(&request.base, PROVIDER, CurrencyRole::Base)?;
    if base.as_str() != NATIVE_CURRENCY {
        return Err(ValidationError::UnsupportedBaseCurrency {
            provider: PROVIDER,
            expected: NATIVE_CURRENCY,
            actual: base.to_string(),
        });
    }

    for quote in request.quotes.currencies() {
        require_fiat(quote, PROVIDER, CurrencyRole::Quote)?;
    }

    Ok(())
}

fn map_snapshot(snapshot: RatesOnDateSnapshot) -> Result<RatesOnDate, RateError> {
    let rates = snapshot
        .rates
        .into_iter()
        .map(map_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RatesOnDate::new(snapshot.on_date, rates))
}

fn map_row(row: RateRow) -> Result<CurrencyRate, RateError> {
    let currency = Currency::fiat(&row.char_code).map_err(|error| {
        RateError::invalid_response_with(
            PROVIDER,
            format!("unexpected currency code \"{}\" in rate table", row.char_code),
            error,
        )
    })?;

    Ok(CurrencyRate::new(currency, row.name, row.numeric_code, row.rate)
        .with_unit_rate(row.unit_rate)
        .with_nominal(Some(row.nominal)))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::*;
    use crate::http_client::ScriptedHttpClient;
    use crate::retry::RetryConfig;
    use crate::RateErrorKind;

    const RATES_XML: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
        <GetCursOnDateResponse xmlns="http://web.cbr.ru/"><GetCursOnDateResult>
          <diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1">
            <ValuteData xmlns="" OnDate="20240110">
              <ValuteCursOnDate><Vname>Евро</Vname><Vnom>1</Vnom><Vcurs>98,1234</Vcurs><Vcode>978</Vcode><VchCode>EUR</VchCode></ValuteCursOnDate>
              <ValuteCursOnDate><Vname>Доллар США</Vname><Vnom>10</Vnom><Vcurs>901,234</Vcurs><Vcode>840</Vcode><VchCode>USD</VchCode></ValuteCursOnDate>
            </ValuteData>
          </diffgr:diffgram>
        </GetCursOnDateResult></GetCursOnDateResponse></soap:Body></soap:Envelope>"#;

    fn fiat(code: &str) -> Currency {
        Currency::fiat(code).expect("valid code")
    }

    fn adapter(http: &Arc<ScriptedHttpClient>) -> CbrAdapter {
        CbrAdapter::new(CbrSoapClient::new(http.clone()).with_retry(RetryConfig::no_retry()))
    }

    #[tokio::test]
    async fn single_quote_returns_single_rate() {
        let http = Arc::new(ScriptedHttpClient::always(Ok(
            crate::http_client::HttpResponse::ok(RATES_XML),
        )));
        let request = RateRequest::single(fiat("RUB"), fiat("usd"), date!(2024 - 01 - 10));

        let rate = adapter(&http)
            .rates(&request)
            .await
            .expect("rate")
            .into_single()
            .expect("single shape");

        assert_eq!(rate.numeric_code, "840");
        assert_eq!(rate.nominal, Some(10));
        assert_eq!(rate.per_unit(), dec!(90.1234));
    }

    #[tokio::test]
    async fn many_quotes_follow_request_order() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(RATES_XML));
        let request = RateRequest::many(
            fiat("RUB"),
            vec![fiat("USD"), fiat("GBP"), fiat("EUR")],
            date!(2024 - 01 - 10),
        )
        .unwrap();

        let lookup = adapter(&http).rates(&request).await.expect("rates");
        let codes: Vec<String> = lookup.rates().iter().map(|r| r.currency.code()).collect();

        assert_eq!(codes, vec!["USD", "EUR"]);
    }

    #[tokio::test]
    async fn missing_single_quote_is_not_found() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(RATES_XML));
        let request = RateRequest::single(fiat("RUB"), fiat("GBP"), date!(2024 - 01 - 10));

        let error = adapter(&http).rates(&request).await.unwrap_err();
        assert_eq!(error.kind(), RateErrorKind::CurrencyNotFound);
        assert!(error.to_string().contains("GBP"));
    }

    #[tokio::test]
    async fn non_rub_base_is_rejected_before_any_call() {
        let http = Arc::new(ScriptedHttpClient::new());
        let request = RateRequest::single(fiat("USD"), fiat("EUR"), date!(2024 - 01 - 10));

        let error = adapter(&http).rates(&request).await.unwrap_err();

        assert!(matches!(
            error,
            RateError::Validation(ValidationError::UnsupportedBaseCurrency { ref actual, .. }) if actual == "USD"
        ));
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn crypto_is_rejected_on_either_side() {
        let http = Arc::new(ScriptedHttpClient::new());
        let btc = Currency::crypto("BTC", None).unwrap();

        let as_quote = RateRequest::single(fiat("RUB"), btc.clone(), date!(2024 - 01 - 10));
        let as_base = RateRequest::single(btc, fiat("USD"), date!(2024 - 01 - 10));

        for request in [as_quote, as_base] {
            let error = adapter(&http).rates(&request).await.unwrap_err();
            assert_eq!(error.kind(), RateErrorKind::Validation);
        }
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn snapshot_exposes_publication_date() {
        let http = Arc::new(ScriptedHttpClient::new().respond_ok(RATES_XML));

        let snapshot = adapter(&http).snapshot(date!(2024 - 01 - 09)).await.unwrap();

        assert_eq!(snapshot.date(), date!(2024 - 01 - 10));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("eur").unwrap().rate, dec!(98.1234));
    }
}
