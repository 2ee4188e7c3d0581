use std::sync::Arc;
use std::time::Instant;

use ferrofx_core::{CbrAdapter, HttpClient, ProviderId, RatesConfig};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::error::CliError;

use super::{elapsed_ms, CommandResult};

#[derive(Debug, Serialize)]
struct LatestResponseData {
    published_at: String,
}

/// Always asks the CBR service, whichever provider is selected.
pub async fn run(config: &RatesConfig, http: Arc<dyn HttpClient>) -> Result<CommandResult, CliError> {
    let adapter = CbrAdapter::from_config(&config.provider_config(ProviderId::Cbr.as_str()), http);

    let started = Instant::now();
    let published = adapter.latest_publication_time().await?;
    let latency_ms = elapsed_ms(started);

    let data = serde_json::to_value(LatestResponseData {
        published_at: published.format(&Rfc3339)?,
    })?;

    Ok(CommandResult::ok(data)
        .with_provider(ProviderId::Cbr)
        .with_latency(latency_ms))
}
