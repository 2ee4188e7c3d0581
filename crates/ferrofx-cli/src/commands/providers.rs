use ferrofx_core::{factory, AdapterFactory, RatesConfig};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ProviderView {
    key: &'static str,
    name: &'static str,
    adapter: String,
    configurable: bool,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct ProvidersResponseData {
    providers: Vec<ProviderView>,
}

pub fn run(config: &RatesConfig) -> Result<CommandResult, CliError> {
    let selected = factory::type_name_for(&config.provider);
    let providers: Vec<ProviderView> = AdapterFactory::with_defaults()
        .entries()
        .into_iter()
        .map(|entry| ProviderView {
            key: entry.provider.as_str(),
            name: entry.provider.display_name(),
            selected: entry.type_name == selected,
            adapter: entry.type_name,
            configurable: entry.constructible,
        })
        .collect();

    let data = serde_json::to_value(ProvidersResponseData { providers })?;
    Ok(CommandResult::ok(data))
}
