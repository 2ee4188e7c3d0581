//! Provider key to adapter constructor registry.
//!
//! Keys go through a fixed naming transform (`exchange_rate_host` →
//! `ExchangeRateHostAdapter`) and the resulting type name is looked up in an
//! explicit table. Nothing is discovered at runtime: a new provider means a
//! new [`AdapterFactory::register`] call.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::adapters::{CbrAdapter, CurrencyFreaksAdapter, ExchangeRateHostAdapter, RateAdapter};
use crate::config::ProviderConfig;
use crate::http_client::HttpClient;
use crate::{ConfigError, ProviderId};

pub type AdapterConstructor =
    fn(&ProviderConfig, Arc<dyn HttpClient>) -> Result<Arc<dyn RateAdapter>, ConfigError>;

#[derive(Debug, Clone, Copy)]
struct Registration {
    provider: ProviderId,
    constructor: Option<AdapterConstructor>,
}

/// Registered adapter as listed by [`AdapterFactory::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterEntry {
    pub type_name: String,
    pub provider: ProviderId,
    pub constructible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AdapterFactory {
    registry: BTreeMap<String, Registration>,
}

impl AdapterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in providers. The fake adapter is listed but has no
    /// configuration constructor.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register("CbrAdapter", ProviderId::Cbr, Some(build_cbr));
        factory.register(
            "CurrencyFreaksAdapter",
            ProviderId::CurrencyFreaks,
            Some(build_currency_freaks),
        );
        factory.register(
            "ExchangeRateHostAdapter",
            ProviderId::ExchangeRateHost,
            Some(build_exchange_rate_host),
        );
        factory.register("FakeAdapter", ProviderId::Fake, None);
        factory
    }

    /// Adds or replaces the registration for `type_name`.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        provider: ProviderId,
        constructor: Option<AdapterConstructor>,
    ) -> &mut Self {
        self.registry.insert(
            type_name.into(),
            Registration {
                provider,
                constructor,
            },
        );
        self
    }

    pub fn entries(&self) -> Vec<AdapterEntry> {
        self.registry
            .iter()
            .map(|(type_name, registration)| AdapterEntry {
                type_name: type_name.clone(),
                provider: registration.provider,
                constructible: registration.constructor.is_some(),
            })
            .collect()
    }

    /// Finds the constructor for `key` without building anything.
    pub fn resolve(&self, key: &str) -> Result<AdapterConstructor, ConfigError> {
        self.lookup(key).map(|(_, _, constructor)| constructor)
    }

    pub fn create(
        &self,
        key: &str,
        config: &ProviderConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Arc<dyn RateAdapter>, ConfigError> {
        let (type_name, expected, constructor) = self.lookup(key)?;
        let adapter = constructor(config, http)?;

        if adapter.provider() != expected {
            return Err(ConfigError::InvalidAdapter {
                provider: key.to_owned(),
                type_name,
            });
        }

        tracing::debug!(provider = %expected, adapter = %type_name, "rate adapter created");
        Ok(adapter)
    }

    fn lookup(&self, key: &str) -> Result<(String, ProviderId, AdapterConstructor), ConfigError> {
        let type_name = type_name_for(key);
        let registration =
            self.registry
                .get(&type_name)
                .ok_or_else(|| ConfigError::AdapterNotFound {
                    provider: key.to_owned(),
                    type_name: type_name.clone(),
                })?;

        let constructor = registration
            .constructor
            .ok_or_else(|| ConfigError::MissingConstructor {
                provider: key.to_owned(),
                type_name: type_name.clone(),
            })?;

        Ok((type_name, registration.provider, constructor))
    }
}

/// `currency-freaks` / `currency_freaks` → `CurrencyFreaksAdapter`.
pub fn type_name_for(key: &str) -> String {
    let mut name: String = key
        .trim()
        .to_ascii_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    name.push_str("Adapter");
    name
}

fn build_cbr(
    config: &ProviderConfig,
    http: Arc<dyn HttpClient>,
) -> Result<Arc<dyn RateAdapter>, ConfigError> {
    Ok(Arc::new(CbrAdapter::from_config(config, http)))
}

fn build_currency_freaks(
    config: &ProviderConfig,
    http: Arc<dyn HttpClient>,
) -> Result<Arc<dyn RateAdapter>, ConfigError> {
    Ok(Arc::new(CurrencyFreaksAdapter::from_config(config, http)?))
}

fn build_exchange_rate_host(
    config: &ProviderConfig,
    http: Arc<dyn HttpClient>,
) -> Result<Arc<dyn RateAdapter>, ConfigError> {
    Ok(Arc::new(ExchangeRateHostAdapter::from_config(config, http)))
}
