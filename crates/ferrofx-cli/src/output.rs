use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::commands::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct Meta<'a> {
    provider: Option<&'a str>,
    cache_enabled: bool,
    latency_ms: u64,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    meta: Meta<'a>,
    data: &'a Value,
}

pub fn render(result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let rendered = to_json(result, pretty)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn to_json(result: &CommandResult, pretty: bool) -> Result<String, CliError> {
    let document = Document {
        meta: Meta {
            provider: result.provider.map(|provider| provider.as_str()),
            cache_enabled: result.cache_enabled,
            latency_ms: result.latency_ms,
        },
        data: &result.data,
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(rendered)
}
