//! Adapter contract shared by every provider.
//!
//! Each case answers from canned upstream payloads, so the contract is
//! checked offline: output shape follows the request, lists keep request
//! order, and unsupported currencies fail before any network call.

use std::sync::Arc;

use ferrofx_core::{
    CbrAdapter, CbrSoapClient, Currency, CurrencyFreaksAdapter, CurrencyFreaksClient,
    ExchangeRateHostAdapter, ExchangeRateHostClient, FakeRatesAdapter, HttpResponse, ProviderId,
    RateAdapter, RateErrorKind, RateLookup, RateRequest, RetryConfig, ScriptedHttpClient,
};
use rust_decimal_macros::dec;
use time::macros::date;
use time::Date;

const ON_DATE: Date = date!(2024 - 01 - 10);

const CBR_RATES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <GetCursOnDateResponse xmlns="http://web.cbr.ru/">
      <GetCursOnDateResult>
        <xs:schema id="ValuteData" xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:element name="ValuteData"/>
        </xs:schema>
        <diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1">
          <ValuteData xmlns="" OnDate="20240110">
            <ValuteCursOnDate><Vname>Фунт стерлингов</Vname><Vnom>1</Vnom><Vcurs>113,4548</Vcurs><Vcode>826</Vcode><VchCode>GBP</VchCode></ValuteCursOnDate>
            <ValuteCursOnDate><Vname>Евро</Vname><Vnom>1</Vnom><Vcurs>98,1234</Vcurs><Vcode>978</Vcode><VchCode>EUR</VchCode></ValuteCursOnDate>
          </ValuteData>
        </diffgr:diffgram>
      </GetCursOnDateResult>
    </GetCursOnDateResponse>
  </soap:Body>
</soap:Envelope>"#;

const FREAKS_RATES: &str = r#"{"date":"2024-01-10 00:00:00+00","base":"USD","rates":{"GBP":"0.7861","EUR":"0.9134"}}"#;

const HOST_QUOTES: &str =
    r#"{"success":true,"source":"USD","quotes":{"USDGBP":0.7861,"USDEUR":0.9134}}"#;

struct ProviderCase {
    id: ProviderId,
    adapter: Arc<dyn RateAdapter>,
    http: Option<Arc<ScriptedHttpClient>>,
    base: Currency,
    supports_crypto: bool,
}

impl ProviderCase {
    fn requests_sent(&self) -> usize {
        self.http.as_ref().map_or(0, |http| http.request_count())
    }
}

fn fiat(code: &str) -> Currency {
    Currency::fiat(code).expect("valid code")
}

fn scripted(body: &str) -> Arc<ScriptedHttpClient> {
    Arc::new(ScriptedHttpClient::always(Ok(HttpResponse::ok(body))))
}

fn provider_cases() -> Vec<ProviderCase> {
    let cbr_http = scripted(CBR_RATES);
    let freaks_http = scripted(FREAKS_RATES);
    let host_http = scripted(HOST_QUOTES);

    let fake = FakeRatesAdapter::new();
    fake.set_rate_value(fiat("USD"), fiat("EUR"), ON_DATE, dec!(0.9134));
    fake.set_rate_values(
        fiat("USD"),
        vec![(fiat("EUR"), dec!(0.9134)), (fiat("GBP"), dec!(0.7861))],
        ON_DATE,
    );

    vec![
        ProviderCase {
            id: ProviderId::Cbr,
            adapter: Arc::new(CbrAdapter::new(
                CbrSoapClient::new(cbr_http.clone()).with_retry(RetryConfig::no_retry()),
            )),
            http: Some(cbr_http),
            base: fiat("RUB"),
            supports_crypto: false,
        },
        ProviderCase {
            id: ProviderId::CurrencyFreaks,
            adapter: Arc::new(CurrencyFreaksAdapter::new(
                CurrencyFreaksClient::new(freaks_http.clone(), "test-key")
                    .with_retry(RetryConfig::no_retry()),
            )),
            http: Some(freaks_http),
            base: fiat("USD"),
            supports_crypto: false,
        },
        ProviderCase {
            id: ProviderId::ExchangeRateHost,
            adapter: Arc::new(ExchangeRateHostAdapter::new(
                ExchangeRateHostClient::new(host_http.clone()).with_retry(RetryConfig::no_retry()),
            )),
            http: Some(host_http),
            base: fiat("USD"),
            supports_crypto: false,
        },
        ProviderCase {
            id: ProviderId::Fake,
            adapter: Arc::new(fake),
            http: None,
            base: fiat("USD"),
            supports_crypto: true,
        },
    ]
}

#[tokio::test]
async fn adapters_report_their_provider() {
    for case in provider_cases() {
        assert_eq!(case.adapter.provider(), case.id);
    }
}

#[tokio::test]
async fn single_quote_yields_single_rate_for_all_providers() {
    for case in provider_cases() {
        let request = RateRequest::single(case.base.clone(), fiat("eur"), ON_DATE);

        let lookup = case
            .adapter
            .rates(&request)
            .await
            .unwrap_or_else(|error| panic!("provider '{}' rate failed: {error}", case.id));

        let RateLookup::Single(rate) = lookup else {
            panic!("provider '{}': expected a single rate", case.id);
        };
        assert_eq!(rate.currency, fiat("EUR"), "provider '{}': currency", case.id);
        assert!(
            rate.per_unit() > dec!(0),
            "provider '{}': per-unit rate must be positive",
            case.id
        );
        assert!(
            !rate.numeric_code.is_empty(),
            "provider '{}': numeric code present",
            case.id
        );
    }
}

#[tokio::test]
async fn quote_list_keeps_request_order_for_all_providers() {
    for case in provider_cases() {
        let request =
            RateRequest::many(case.base.clone(), vec![fiat("GBP"), fiat("EUR")], ON_DATE)
                .expect("non-empty quotes");

        let lookup = case
            .adapter
            .rates(&request)
            .await
            .unwrap_or_else(|error| panic!("provider '{}' rates failed: {error}", case.id));

        let RateLookup::Many(rates) = lookup else {
            panic!("provider '{}': expected a rate list", case.id);
        };
        let codes: Vec<String> = rates.iter().map(|rate| rate.currency.code()).collect();
        assert_eq!(codes, vec!["GBP", "EUR"], "provider '{}': order", case.id);
    }
}

#[tokio::test]
async fn unpublished_quotes_are_left_out_of_lists() {
    for case in provider_cases().into_iter().filter(|case| case.http.is_some()) {
        let request = RateRequest::many(
            case.base.clone(),
            vec![fiat("EUR"), fiat("CHF"), fiat("GBP")],
            ON_DATE,
        )
        .expect("non-empty quotes");

        let rates = case
            .adapter
            .rates(&request)
            .await
            .unwrap_or_else(|error| panic!("provider '{}' rates failed: {error}", case.id))
            .into_rates();

        let codes: Vec<String> = rates.iter().map(|rate| rate.currency.code()).collect();
        assert_eq!(codes, vec!["EUR", "GBP"], "provider '{}': subset", case.id);
    }
}

#[tokio::test]
async fn unpublished_single_quote_is_currency_not_found() {
    for case in provider_cases().into_iter().filter(|case| case.http.is_some()) {
        let request = RateRequest::single(case.base.clone(), fiat("CHF"), ON_DATE);

        let error = case
            .adapter
            .rates(&request)
            .await
            .expect_err("CHF is not published");

        assert_eq!(
            error.kind(),
            RateErrorKind::CurrencyNotFound,
            "provider '{}': error kind",
            case.id
        );
        assert!(error.to_string().contains("CHF"), "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn crypto_is_rejected_before_any_network_call() {
    let usdt = Currency::crypto("USDT", Some("tron")).expect("valid crypto");

    for case in provider_cases().into_iter().filter(|case| !case.supports_crypto) {
        let as_quote = RateRequest::single(case.base.clone(), usdt.clone(), ON_DATE);
        let as_base = RateRequest::single(usdt.clone(), fiat("EUR"), ON_DATE);

        for request in [as_quote, as_base] {
            let error = case
                .adapter
                .rates(&request)
                .await
                .expect_err("crypto must be rejected");
            assert_eq!(
                error.kind(),
                RateErrorKind::Validation,
                "provider '{}': error kind",
                case.id
            );
            assert_eq!(error.provider(), Some(case.id));
        }

        assert_eq!(case.requests_sent(), 0, "provider '{}': no requests", case.id);
    }
}
