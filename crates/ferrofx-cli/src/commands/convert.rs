use std::str::FromStr;
use std::time::Instant;

use ferrofx_core::{format_decimal, RateService};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::ConvertArgs;
use crate::error::CliError;

use super::rate::RateView;
use super::{elapsed_ms, parse_currency, parse_date, CommandResult};

#[derive(Debug, Serialize)]
struct ConvertResponseData {
    base: String,
    quote: String,
    date: String,
    amount: String,
    rate: RateView,
    result: String,
}

pub async fn run(args: &ConvertArgs, service: &RateService) -> Result<CommandResult, CliError> {
    let amount = parse_amount(&args.amount)?;
    let base = parse_currency(&args.base)?;
    let quote = parse_currency(&args.quote)?;
    let date = parse_date(args.date.as_deref())?;

    let started = Instant::now();
    let conversion = service
        .conversion(base.clone(), quote.clone(), date, amount)
        .await?;
    let latency_ms = elapsed_ms(started);

    let data = serde_json::to_value(ConvertResponseData {
        base: base.code(),
        quote: quote.code(),
        date: date.to_string(),
        amount: format_decimal(conversion.amount),
        rate: RateView::from(&conversion.rate),
        result: format_decimal(conversion.result),
    })?;

    Ok(CommandResult::ok(data)
        .with_provider(service.provider())
        .with_cache_enabled(service.is_cached())
        .with_latency(latency_ms))
}

fn parse_amount(raw: &str) -> Result<Decimal, CliError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|error| CliError::InvalidArgument(format!("amount '{raw}': {error}")))
}
