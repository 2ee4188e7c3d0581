use std::time::Instant;

use ferrofx_core::{CurrencyRate, RateRequest, RateService};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::RateArgs;
use crate::error::CliError;

use super::{elapsed_ms, parse_currency, parse_date, CommandResult};

#[derive(Debug, Serialize)]
pub(crate) struct RateView {
    pub code: String,
    pub name: String,
    pub numeric_code: String,
    pub rate: Decimal,
    pub nominal: Option<u32>,
    pub unit_rate: Option<Decimal>,
    pub per_unit: Decimal,
}

impl From<&CurrencyRate> for RateView {
    fn from(rate: &CurrencyRate) -> Self {
        Self {
            code: rate.currency.code(),
            name: rate.name.clone(),
            numeric_code: rate.numeric_code.clone(),
            rate: rate.rate,
            nominal: rate.nominal,
            unit_rate: rate.unit_rate,
            per_unit: rate.per_unit(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RateResponseData {
    base: String,
    date: String,
    rates: Vec<RateView>,
}

pub async fn run(args: &RateArgs, service: &RateService) -> Result<CommandResult, CliError> {
    let base = parse_currency(&args.base)?;
    let mut quotes = args
        .quotes
        .iter()
        .map(|raw| parse_currency(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let date = parse_date(args.date.as_deref())?;

    let request = if quotes.len() == 1 {
        RateRequest::single(base.clone(), quotes.remove(0), date)
    } else {
        RateRequest::many(base.clone(), quotes, date)?
    };

    let started = Instant::now();
    let lookup = service.rates(&request).await?;
    let latency_ms = elapsed_ms(started);

    let data = serde_json::to_value(RateResponseData {
        base: base.code(),
        date: date.to_string(),
        rates: lookup.rates().iter().map(RateView::from).collect(),
    })?;

    Ok(CommandResult::ok(data)
        .with_provider(service.provider())
        .with_cache_enabled(service.is_cached())
        .with_latency(latency_ms))
}
