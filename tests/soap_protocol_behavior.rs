//! Behavior tests for the CBR SOAP protocol
//!
//! These tests verify HOW the SOAP client frames requests and unwraps
//! responses: envelope and headers on the way out, then fault precedence,
//! structural errors and row mapping on the way back.

use std::sync::Arc;
use std::time::Duration;

use ferrofx_core::client::cbr::CBR_NAMESPACE;
use ferrofx_core::client::soap;
use ferrofx_core::{
    CbrAdapter, CbrSoapClient, HttpError, HttpMethod, HttpResponse, ProviderId, RateError,
    RateErrorKind, RetryConfig, ScriptedHttpClient,
};
use rust_decimal_macros::dec;
use time::macros::{date, datetime};

const RATES_ENVELOPE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <GetCursOnDateResponse xmlns="http://web.cbr.ru/">
      <GetCursOnDateResult>
        <xs:schema id="ValuteData" xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:element name="ValuteData">
            <xs:complexType><xs:sequence><xs:element name="ValuteCursOnDate"/></xs:sequence></xs:complexType>
          </xs:element>
        </xs:schema>
        <diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1">
          <ValuteData xmlns="" OnDate="20240110">
            <ValuteCursOnDate>
              <Vname>Японских иен   </Vname>
              <Vnom>100</Vnom>
              <Vcurs>61,6438</Vcurs>
              <Vcode>392</Vcode>
              <VchCode>JPY</VchCode>
              <VunitRate>0,616438</VunitRate>
            </ValuteCursOnDate>
            <ValuteCursOnDate>
              <Vname>Доллар США</Vname>
              <Vnom>1</Vnom>
              <Vcurs>89,6883</Vcurs>
              <Vcode>840</Vcode>
              <VchCode>USD</VchCode>
            </ValuteCursOnDate>
          </ValuteData>
        </diffgr:diffgram>
      </GetCursOnDateResult>
    </GetCursOnDateResponse>
  </soap:Body>
</soap:Envelope>"#;

fn client(http: &Arc<ScriptedHttpClient>) -> CbrSoapClient {
    CbrSoapClient::new(http.clone())
        .with_base_uri("https://cbr.test/DailyInfo.asmx/")
        .with_retry(RetryConfig::no_retry())
}

fn scripted(body: &str) -> Arc<ScriptedHttpClient> {
    Arc::new(ScriptedHttpClient::new().respond_ok(body))
}

// =============================================================================
// Request framing
// =============================================================================

#[tokio::test]
async fn when_rates_are_requested_system_posts_a_soap11_envelope() {
    // Given: A SOAP client over a scripted transport
    let http = scripted(RATES_ENVELOPE);

    // When: Rates for a date are requested
    client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect("rates should parse");

    // Then: The request is a SOAP 1.1 POST naming the action
    let requests = http.recorded_requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "https://cbr.test/DailyInfo.asmx");
    assert_eq!(request.header("Content-Type"), Some("text/xml; charset=utf-8"));
    assert_eq!(
        request.header("SOAPAction"),
        Some(format!("{CBR_NAMESPACE}GetCursOnDate").as_str())
    );

    let body = request.body.as_deref().expect("envelope body");
    assert!(body.contains(soap::SOAP11_NAMESPACE));
    assert!(body.contains(r#"<GetCursOnDate xmlns="http://web.cbr.ru/">"#));
    assert!(body.contains("<On_date>2024-01-10T00:00:00</On_date>"));
}

#[test]
fn when_parameters_contain_markup_system_escapes_them() {
    let envelope = soap::build_envelope("Echo", "urn:test", &[("Text", r#"<a & "b">"#)]);

    assert!(envelope.contains("<Text>&lt;a &amp; &quot;b&quot;&gt;</Text>"));
    assert!(!envelope.contains("<a &"));
}

// =============================================================================
// Response unwrapping
// =============================================================================

#[tokio::test]
async fn when_response_is_valid_system_maps_every_row() {
    // Given: A daily rate table with nominal and unit rates
    let http = scripted(RATES_ENVELOPE);

    // When: The snapshot is fetched
    let snapshot = client(&http)
        .rates_on_date(date!(2024 - 01 - 09))
        .await
        .expect("rates should parse");

    // Then: Rows are mapped with decimal commas and trimmed text
    assert_eq!(snapshot.on_date, date!(2024 - 01 - 10));
    assert_eq!(snapshot.rates.len(), 2);

    let yen = &snapshot.rates[0];
    assert_eq!(yen.name, "Японских иен");
    assert_eq!(yen.nominal, 100);
    assert_eq!(yen.rate, dec!(61.6438));
    assert_eq!(yen.unit_rate, Some(dec!(0.616438)));
    assert_eq!(yen.numeric_code, "392");
    assert_eq!(yen.char_code, "JPY");

    assert_eq!(snapshot.rates[1].unit_rate, None);
}

#[tokio::test]
async fn when_dataset_has_no_date_system_keeps_requested_date() {
    let body = RATES_ENVELOPE.replace(r#" OnDate="20240110""#, "");
    let http = scripted(&body);

    let snapshot = client(&http)
        .rates_on_date(date!(2024 - 01 - 09))
        .await
        .expect("rates should parse");

    assert_eq!(snapshot.on_date, date!(2024 - 01 - 09));
}

#[tokio::test]
async fn when_fault_is_present_system_reports_it_before_reading_data() {
    // Given: A body carrying both a fault and a well-formed result
    let body = RATES_ENVELOPE.replace(
        "<soap:Body>",
        "<soap:Body><soap:Fault><faultcode>soap:Server</faultcode>\
         <faultstring>Server was unable to process request.</faultstring></soap:Fault>",
    );
    let http = scripted(&body);

    // When: Rates are requested
    let error = client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("fault must win");

    // Then: The fault is surfaced with its code and message
    assert_eq!(error.kind(), RateErrorKind::ProtocolFault);
    assert_eq!(
        error.to_string(),
        "CBR SOAP fault (soap:Server): Server was unable to process request."
    );
}

#[tokio::test]
async fn when_soap12_fault_arrives_with_http_500_system_reports_protocol_fault() {
    let fault = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
      <env:Body><env:Fault>
        <env:Code><env:Value>env:Sender</env:Value></env:Code>
        <env:Reason><env:Text xml:lang="en">Bad On_date</env:Text></env:Reason>
      </env:Fault></env:Body></env:Envelope>"#;
    let http = Arc::new(ScriptedHttpClient::new().respond(Ok(HttpResponse::new(500, fault))));

    let error = client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("fault expected");

    assert!(matches!(
        error,
        RateError::ProtocolFault { ref code, ref message, provider: ProviderId::Cbr }
            if code == "env:Sender" && message == "Bad On_date"
    ));
}

#[tokio::test]
async fn when_server_errors_without_fault_system_reports_request_failure() {
    let http = Arc::new(
        ScriptedHttpClient::new().respond(Ok(HttpResponse::new(503, "Service Unavailable"))),
    );

    let error = client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("503 expected");

    assert!(matches!(
        error,
        RateError::RequestFailure {
            status: Some(503),
            ..
        }
    ));
}

#[tokio::test]
async fn when_result_node_is_missing_system_reports_missing_result() {
    let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
      <soap:Body><GetCursOnDateResponse xmlns="http://web.cbr.ru/"/></soap:Body></soap:Envelope>"#;
    let http = scripted(body);

    let error = client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("missing result");

    assert!(matches!(
        error,
        RateError::MissingResult { ref action, .. } if action == "GetCursOnDate"
    ));
}

#[tokio::test]
async fn when_dataset_only_appears_in_schema_system_reports_missing_dataset() {
    // Given: A result whose only ValuteData element sits inside the schema
    let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
      <soap:Body><GetCursOnDateResponse xmlns="http://web.cbr.ru/"><GetCursOnDateResult>
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><ValuteData/></xs:schema>
        <diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1"/>
      </GetCursOnDateResult></GetCursOnDateResponse></soap:Body></soap:Envelope>"#;
    let http = scripted(body);

    // When: Rates are requested
    let error = client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("missing dataset");

    // Then: The error names both the action and the node
    assert_eq!(error.kind(), RateErrorKind::MissingDataset);
    assert_eq!(
        error.to_string(),
        "[CBR] Missing ValuteData dataset inside GetCursOnDate response"
    );
}

#[tokio::test]
async fn when_envelope_is_unprefixed_system_still_finds_the_body() {
    let body = r#"<Envelope><Body><GetLatestDateTimeResponse><GetLatestDateTimeResult>
        2024-01-10T00:00:00+03:00</GetLatestDateTimeResult></GetLatestDateTimeResponse></Body></Envelope>"#;
    let http = scripted(body);

    let published = client(&http)
        .latest_publication_time()
        .await
        .expect("publication time");

    assert_eq!(published, datetime!(2024-01-10 00:00:00 +3));
}

#[tokio::test]
async fn when_body_is_not_xml_system_reports_invalid_response() {
    let http = scripted("<html><body>maintenance");

    let error = client(&http)
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("parse failure");

    assert_eq!(error.kind(), RateErrorKind::InvalidResponse);
    assert!(std::error::Error::source(&error).is_some());
}

// =============================================================================
// Other actions
// =============================================================================

#[tokio::test]
async fn when_publication_time_has_no_offset_system_assumes_moscow_time() {
    let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
        <GetLatestDateTimeResponse xmlns="http://web.cbr.ru/">
          <GetLatestDateTimeResult>2024-01-10T00:00:00</GetLatestDateTimeResult>
        </GetLatestDateTimeResponse></soap:Body></soap:Envelope>"#;
    let http = scripted(body);

    let published = client(&http)
        .latest_publication_time()
        .await
        .expect("publication time");

    assert_eq!(published, datetime!(2024-01-10 00:00:00 +3));
    assert_eq!(
        http.recorded_requests()[0].header("SOAPAction"),
        Some("http://web.cbr.ru/GetLatestDateTime")
    );
}

#[tokio::test]
async fn when_publication_time_is_blank_system_reports_invalid_datetime() {
    let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
        <GetLatestDateTimeResponse xmlns="http://web.cbr.ru/">
          <GetLatestDateTimeResult>   </GetLatestDateTimeResult>
        </GetLatestDateTimeResponse></soap:Body></soap:Envelope>"#;
    let http = scripted(body);

    let error = client(&http)
        .latest_publication_time()
        .await
        .expect_err("blank time");

    assert_eq!(error.kind(), RateErrorKind::InvalidDateTime);
}

#[tokio::test]
async fn when_dictionary_is_requested_system_maps_optional_codes() {
    // Given: A monthly dictionary with one entry lacking ISO codes
    let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
      <EnumValutesResponse xmlns="http://web.cbr.ru/"><EnumValutesResult>
        <diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1">
          <ValuteData xmlns="">
            <EnumValute><Vcode>R01235</Vcode><Vname>Доллар США</Vname><VEngname>US Dollar</VEngname>
              <Vnom>1</Vnom><VcommonCode>R01235</VcommonCode><VnumCode>840</VnumCode><VcharCode>USD</VcharCode></EnumValute>
            <EnumValute><Vcode>R01010</Vcode><Vname>Австралийский доллар</Vname><VEngname>Australian Dollar</VEngname>
              <Vnom>1</Vnom><VcommonCode>R01010</VcommonCode><VnumCode></VnumCode><VcharCode> </VcharCode></EnumValute>
          </ValuteData>
        </diffgr:diffgram>
      </EnumValutesResult></EnumValutesResponse></soap:Body></soap:Envelope>"#;
    let http = scripted(body);

    // When: The monthly dictionary is requested through the adapter
    let adapter = CbrAdapter::new(client(&http));
    let dictionary = adapter.currencies(true).await.expect("dictionary");

    // Then: Empty codes are absent and the request selects the monthly list
    assert_eq!(dictionary.items.len(), 2);
    let usd = dictionary.by_char_code("usd").expect("USD entry");
    assert_eq!(usd.english_name, "US Dollar");
    assert_eq!(usd.numeric_code.as_deref(), Some("840"));

    let aud = &dictionary.items[1];
    assert_eq!(aud.numeric_code, None);
    assert_eq!(aud.char_code, None);

    let sent = http.recorded_requests()[0].body.clone().unwrap_or_default();
    assert!(sent.contains("<Seld>true</Seld>"));
}

// =============================================================================
// Transport resilience
// =============================================================================

#[tokio::test]
async fn when_first_attempt_fails_system_retries_with_fixed_delay() {
    // Given: A transport that fails once with a retryable status
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond(Ok(HttpResponse::new(503, "busy")))
            .respond_ok(RATES_ENVELOPE),
    );
    let client = client(&http).with_retry(RetryConfig::from_attempts(2, Duration::from_millis(5)));

    // When: Rates are requested
    let snapshot = client
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect("second attempt succeeds");

    // Then: Exactly two attempts were made
    assert_eq!(snapshot.rates.len(), 2);
    assert_eq!(http.request_count(), 2);
}

#[tokio::test]
async fn when_connection_keeps_failing_system_reports_connection_failure() {
    let http = Arc::new(ScriptedHttpClient::always(Err(HttpError::connect(
        "connection refused",
    ))));
    let client = client(&http).with_retry(RetryConfig::from_attempts(3, Duration::ZERO));

    let error = client
        .rates_on_date(date!(2024 - 01 - 10))
        .await
        .expect_err("connection refused");

    assert_eq!(error.kind(), RateErrorKind::ConnectionFailure);
    assert_eq!(error.provider(), Some(ProviderId::Cbr));
    assert_eq!(http.request_count(), 3);
}
