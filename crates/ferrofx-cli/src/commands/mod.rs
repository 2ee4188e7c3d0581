mod convert;
mod latest;
mod providers;
mod rate;

use std::str::FromStr;
use std::sync::Arc;

use ferrofx_core::{
    Currency, HttpClient, ProviderId, RateService, RatesConfig, ReqwestHttpClient,
};
use serde_json::Value;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub provider: Option<ProviderId>,
    pub cache_enabled: bool,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            provider: None,
            cache_enabled: false,
            latency_ms: 0,
        }
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cache_enabled(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let config = load_config(cli)?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    match &cli.command {
        Command::Rate(args) => {
            let service = RateService::from_config(&config, http)?;
            rate::run(args, &service).await
        }
        Command::Convert(args) => {
            let service = RateService::from_config(&config, http)?;
            convert::run(args, &service).await
        }
        Command::Latest => latest::run(&config, http).await,
        Command::Providers => providers::run(&config),
    }
}

/// File settings, then `FERROFX_*` variables, then command-line flags.
fn load_config(cli: &Cli) -> Result<RatesConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => RatesConfig::from_file(path)?,
        None => RatesConfig::default(),
    };
    config.apply_process_env()?;

    if let Some(provider) = &cli.provider {
        config.provider = provider.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }

    tracing::debug!(provider = %config.provider, cache = config.cache.enabled, "configuration loaded");
    Ok(config)
}

pub(crate) fn parse_currency(raw: &str) -> Result<Currency, CliError> {
    Ok(Currency::from_str(raw)?)
}

/// `YYYY-MM-DD`, or today in UTC when absent.
pub(crate) fn parse_date(raw: Option<&str>) -> Result<Date, CliError> {
    match raw {
        Some(raw) => Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|error| CliError::InvalidArgument(format!("date '{raw}': {error}"))),
        None => Ok(OffsetDateTime::now_utc().date()),
    }
}

pub(crate) fn elapsed_ms(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
