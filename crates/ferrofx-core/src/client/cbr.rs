use std::sync::Arc;
use std::time::Duration;

use roxmltree::Node;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, offset};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

use super::dto::{
    parse_decimal, CurrencyDictionaryEntry, CurrencyDictionarySnapshot, RateRow,
    RatesOnDateSnapshot,
};
use super::soap::{self, SoapError};
use crate::config::ProviderConfig;
use crate::error::BoxError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::{send_with_retry, RetryConfig};
use crate::{ProviderId, RateError};

pub const CBR_NAMESPACE: &str = "http://web.cbr.ru/";
pub const DEFAULT_BASE_URI: &str = "https://www.cbr.ru/DailyInfoWebServ/DailyInfo.asmx";

const DAILY_RATES_ACTION: &str = "GetCursOnDate";
const ENUM_CURRENCIES_ACTION: &str = "EnumValutes";
const LATEST_DATE_TIME_ACTION: &str = "GetLatestDateTime";

const DATASET_NODE: &str = "ValuteData";
const RATE_ROW: &str = "ValuteCursOnDate";
const DICTIONARY_ROW: &str = "EnumValute";

const PROVIDER: ProviderId = ProviderId::Cbr;

/// Client for the Central Bank of Russia DailyInfo SOAP service.
#[derive(Clone)]
pub struct CbrSoapClient {
    http: Arc<dyn HttpClient>,
    base_uri: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl CbrSoapClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            base_uri: String::from(DEFAULT_BASE_URI),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::from_attempts(1, Duration::from_millis(100)),
        }
    }

    pub fn from_config(config: &ProviderConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            base_uri: config.base_uri_or(DEFAULT_BASE_URI),
            timeout: config.timeout(),
            retry: config.retry(),
        }
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.base_uri.trim_end_matches('/')
    }

    /// Daily rate table. The publication date is taken from the dataset's
    /// `OnDate` attribute and falls back to the requested date.
    pub async fn rates_on_date(&self, date: Date) -> Result<RatesOnDateSnapshot, RateError> {
        let on_date = format_on_date(date);
        let body = self
            .call(DAILY_RATES_ACTION, &[("On_date", on_date.as_str())])
            .await?;

        let document = parse(&body, DAILY_RATES_ACTION)?;
        let result = soap::unwrap_result(&document, DAILY_RATES_ACTION).map_err(soap_error)?;
        let dataset =
            soap::require_dataset(result, DAILY_RATES_ACTION, DATASET_NODE).map_err(soap_error)?;

        let published = match dataset.attribute("OnDate").map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_on_date(raw)?,
            _ => date,
        };

        let rates = soap::rows(dataset, RATE_ROW)
            .into_iter()
            .map(map_rate_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            requested = %date,
            published = %published,
            rows = rates.len(),
            "received CBR daily rates"
        );

        Ok(RatesOnDateSnapshot {
            on_date: published,
            rates,
        })
    }

    /// Currency dictionary; `monthly` selects the monthly-published list.
    pub async fn enum_currencies(
        &self,
        monthly: bool,
    ) -> Result<CurrencyDictionarySnapshot, RateError> {
        let seld = if monthly { "true" } else { "false" };
        let body = self.call(ENUM_CURRENCIES_ACTION, &[("Seld", seld)]).await?;

        let document = parse(&body, ENUM_CURRENCIES_ACTION)?;
        let result =
            soap::unwrap_result(&document, ENUM_CURRENCIES_ACTION).map_err(soap_error)?;
        let dataset = soap::require_dataset(result, ENUM_CURRENCIES_ACTION, DATASET_NODE)
            .map_err(soap_error)?;

        let items = soap::rows(dataset, DICTIONARY_ROW)
            .into_iter()
            .map(map_dictionary_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CurrencyDictionarySnapshot { items })
    }

    /// Time of the most recent rate publication.
    ///
    /// Values without an offset are Moscow time.
    pub async fn latest_publication_time(&self) -> Result<OffsetDateTime, RateError> {
        let body = self.call(LATEST_DATE_TIME_ACTION, &[]).await?;

        let document = parse(&body, LATEST_DATE_TIME_ACTION)?;
        let result =
            soap::unwrap_result(&document, LATEST_DATE_TIME_ACTION).map_err(soap_error)?;

        parse_publication_time(soap::text_of(result))
    }

    async fn call(&self, action: &str, parameters: &[(&str, &str)]) -> Result<String, RateError> {
        let envelope = soap::build_envelope(action, CBR_NAMESPACE, parameters);
        let request = HttpRequest::post(self.endpoint())
            .with_header("Accept", "text/xml, application/soap+xml")
            .with_header("Content-Type", "text/xml; charset=utf-8")
            .with_header("SOAPAction", format!("{CBR_NAMESPACE}{action}"))
            .with_body(envelope)
            .with_timeout(self.timeout);

        tracing::debug!(action, endpoint = self.endpoint(), "calling CBR SOAP action");

        let response = send_with_retry(self.http.as_ref(), request, &self.retry)
            .await
            .map_err(|error| RateError::from_transport(PROVIDER, error))?;

        if !response.is_success() {
            // Faults usually arrive with HTTP 500; report them as faults.
            if let Ok(document) = soap::parse_document(&response.body, action) {
                if let Some(fault) = soap::detect_fault(&document) {
                    return Err(soap_error(fault));
                }
            }
            return Err(RateError::from_status(PROVIDER, response.status));
        }

        Ok(response.body)
    }
}

fn parse<'input>(body: &'input str, action: &str) -> Result<roxmltree::Document<'input>, RateError> {
    soap::parse_document(body, action).map_err(soap_error)
}

fn soap_error(error: SoapError) -> RateError {
    error.into_rate_error(PROVIDER)
}

fn format_on_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}T00:00:00",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Accepts the compact `YYYYMMDD` form used by the service as well as ISO
/// dates, optionally followed by a time part.
fn parse_on_date(raw: &str) -> Result<Date, RateError> {
    let invalid = |source: Option<BoxError>| RateError::InvalidDateTime {
        provider: PROVIDER,
        context: String::from("rates publication"),
        value: raw.to_owned(),
        source,
    };

    let digits: String = match raw.get(..10) {
        Some(prefix) if prefix.as_bytes().get(4) == Some(&b'-') => prefix.replace('-', ""),
        _ => raw.to_owned(),
    };

    if digits.len() != 8 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid(None));
    }

    let number = |range: std::ops::Range<usize>| digits[range].parse::<u16>().unwrap_or_default();
    let year = i32::from(number(0..4));
    let month = u8::try_from(number(4..6)).unwrap_or_default();
    let day = u8::try_from(number(6..8)).unwrap_or_default();

    let month = Month::try_from(month).map_err(|error| invalid(Some(error.into())))?;
    Date::from_calendar_date(year, month, day).map_err(|error| invalid(Some(error.into())))
}

fn parse_publication_time(raw: &str) -> Result<OffsetDateTime, RateError> {
    let invalid = |source: Option<BoxError>| RateError::InvalidDateTime {
        provider: PROVIDER,
        context: String::from("latest rates"),
        value: raw.to_owned(),
        source,
    };

    if raw.is_empty() {
        return Err(invalid(None));
    }

    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(parsed);
    }

    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(raw, local)
        .map(|value| value.assume_offset(offset!(+3)))
        .map_err(|error| invalid(Some(error.into())))
}

fn map_rate_row(node: Node<'_, '_>) -> Result<RateRow, RateError> {
    let char_code = soap::child_text(node, "VchCode").unwrap_or_default();
    let raw_rate = soap::child_text(node, "Vcurs").unwrap_or_default();

    let rate = parse_decimal(raw_rate).ok_or_else(|| {
        RateError::invalid_response(
            PROVIDER,
            format!("invalid Vcurs value \"{raw_rate}\" for {char_code}"),
        )
    })?;

    let unit_rate = match soap::optional_text(node, "VunitRate") {
        Some(raw) => Some(parse_decimal(raw).ok_or_else(|| {
            RateError::invalid_response(
                PROVIDER,
                format!("invalid VunitRate value \"{raw}\" for {char_code}"),
            )
        })?),
        None => None,
    };

    Ok(RateRow {
        name: soap::child_text(node, "Vname").unwrap_or_default().to_owned(),
        nominal: parse_nominal(soap::child_text(node, "Vnom"))?,
        rate,
        numeric_code: soap::child_text(node, "Vcode").unwrap_or_default().to_owned(),
        char_code: char_code.to_owned(),
        unit_rate,
    })
}

fn map_dictionary_row(node: Node<'_, '_>) -> Result<CurrencyDictionaryEntry, RateError> {
    let owned = |name: &str| soap::optional_text(node, name).map(str::to_owned);

    Ok(CurrencyDictionaryEntry {
        internal_code: soap::child_text(node, "Vcode").unwrap_or_default().to_owned(),
        name: soap::child_text(node, "Vname").unwrap_or_default().to_owned(),
        english_name: soap::child_text(node, "VEngname").unwrap_or_default().to_owned(),
        nominal: parse_nominal(soap::child_text(node, "Vnom"))?,
        common_code: owned("VcommonCode"),
        numeric_code: owned("VnumCode"),
        char_code: owned("VcharCode"),
    })
}

/// Missing or empty nominals read as zero.
fn parse_nominal(raw: Option<&str>) -> Result<u32, RateError> {
    match raw.filter(|value| !value.is_empty()) {
        None => Ok(0),
        Some(value) => value.parse::<u32>().map_err(|error| {
            RateError::invalid_response_with(
                PROVIDER,
                format!("invalid Vnom value \"{value}\""),
                error,
            )
        }),
    }
}
