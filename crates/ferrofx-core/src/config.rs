//! Provider, transport and cache settings.
//!
//! Settings load from TOML and can be overridden by `FERROFX_*` variables:
//!
//! ```toml
//! provider = "currency_freaks"
//!
//! [providers.currency_freaks]
//! api_key = "..."
//! http = { timeout_secs = 5.0, retry = { times = 3, sleep_ms = 200 } }
//!
//! [cache]
//! ttl_secs = 600
//! ```

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::factory::AdapterFactory;
use crate::retry::RetryConfig;
use crate::{ConfigError, ProviderId};

pub const DEFAULT_PROVIDER: &str = "cbr";
pub const DEFAULT_CACHE_PREFIX: &str = "currency_rates";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
pub const MEMORY_STORE: &str = "memory";

const ENV_PREFIX: &str = "FERROFX";

/// Retry policy as configured: `times` counts every attempt, so `1` means a
/// single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub times: u32,
    pub sleep_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            times: 1,
            sleep_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: f64,
    pub retry: RetrySettings,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetrySettings::default(),
        }
    }
}

/// Settings of one provider.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_uri: Option<String>,
    pub api_key: Option<String>,
    pub access_key: Option<String>,
    pub http: HttpSettings,
}

impl ProviderConfig {
    pub fn base_uri_or(&self, default: &str) -> String {
        self.base_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .unwrap_or(default)
            .to_owned()
    }

    /// Request timeout; invalid values fall back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.http.timeout_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::from_attempts(
            self.http.retry.times,
            Duration::from_millis(self.http.retry.sleep_ms),
        )
    }
}

// Keys stay out of logs.
impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderConfig")
            .field("base_uri", &self.base_uri)
            .field("api_key", &redact(&self.api_key))
            .field("access_key", &redact(&self.access_key))
            .field("http", &self.http)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    /// Store selector; absent means the in-process memory store.
    pub store: Option<String>,
    pub prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            store: None,
            prefix: String::from(DEFAULT_CACHE_PREFIX),
        }
    }
}

impl CacheSettings {
    /// Entry lifetime, never shorter than one second.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub provider: String,
    pub providers: BTreeMap<String, ProviderConfig>,
    pub cache: CacheSettings,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            provider: String::from(DEFAULT_PROVIDER),
            providers: BTreeMap::new(),
            cache: CacheSettings::default(),
        }
    }
}

impl RatesConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|error| ConfigError::Malformed {
            message: error.to_string(),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `FERROFX_*` overrides read through `lookup`.
    ///
    /// Global: `FERROFX_PROVIDER`, `FERROFX_CACHE_ENABLED`, `FERROFX_CACHE_TTL`,
    /// `FERROFX_CACHE_STORE`, `FERROFX_CACHE_PREFIX`. Per provider, with the
    /// key uppercased (`FERROFX_CURRENCY_FREAKS_API_KEY`): `BASE_URI`,
    /// `API_KEY`, `ACCESS_KEY`, `TIMEOUT`, `RETRY_TIMES`, `RETRY_SLEEP`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{ENV_PREFIX}_{suffix}");
            lookup(&name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(|value| (name, value))
        };

        if let Some((_, value)) = var("PROVIDER") {
            self.provider = value;
        }
        if let Some((name, value)) = var("CACHE_ENABLED") {
            self.cache.enabled = parse_bool(&name, &value)?;
        }
        if let Some((name, value)) = var("CACHE_TTL") {
            self.cache.ttl_secs = parse_number(&name, &value)?;
        }
        if let Some((_, value)) = var("CACHE_STORE") {
            self.cache.store = Some(value);
        }
        if let Some((_, value)) = var("CACHE_PREFIX") {
            self.cache.prefix = value;
        }

        let mut keys: Vec<String> = ProviderId::ALL
            .iter()
            .map(|provider| provider.as_str().to_owned())
            .collect();
        keys.extend(self.providers.keys().cloned());
        keys.push(self.provider.clone());
        keys.sort();
        keys.dedup();

        for key in keys {
            let env_key = key.trim().to_ascii_uppercase().replace('-', "_");
            let setting = |name: &str| var(&format!("{env_key}_{name}"));

            let base_uri = setting("BASE_URI");
            let api_key = setting("API_KEY");
            let access_key = setting("ACCESS_KEY");
            let timeout = setting("TIMEOUT");
            let retry_times = setting("RETRY_TIMES");
            let retry_sleep = setting("RETRY_SLEEP");

            let touched = [&base_uri, &api_key, &access_key, &timeout, &retry_times, &retry_sleep]
                .iter()
                .any(|value| value.is_some());
            if !touched {
                continue;
            }

            let provider = self.providers.entry(key).or_default();
            if let Some((_, value)) = base_uri {
                provider.base_uri = Some(value);
            }
            if let Some((_, value)) = api_key {
                provider.api_key = Some(value);
            }
            if let Some((_, value)) = access_key {
                provider.access_key = Some(value);
            }
            if let Some((name, value)) = timeout {
                provider.http.timeout_secs = parse_number(&name, &value)?;
            }
            if let Some((name, value)) = retry_times {
                provider.http.retry.times = parse_number(&name, &value)?;
            }
            if let Some((name, value)) = retry_sleep {
                provider.http.retry.sleep_ms = parse_number(&name, &value)?;
            }
        }

        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides(|name| std::env::var(name).ok())
    }

    /// Settings of the selected provider, defaults when none are configured.
    pub fn selected_provider(&self) -> ProviderConfig {
        self.provider_config(&self.provider)
    }

    pub fn provider_config(&self, key: &str) -> ProviderConfig {
        let normalized = normalize_key(key);
        self.providers
            .iter()
            .find(|(candidate, _)| normalize_key(candidate) == normalized)
            .map(|(_, config)| config.clone())
            .unwrap_or_default()
    }

    /// Startup checks: the provider resolves to a constructible adapter, the
    /// cache store is known and transport settings are usable.
    pub fn validate(&self, factory: &AdapterFactory) -> Result<(), ConfigError> {
        factory.resolve(&self.provider)?;

        if let Some(store) = self.cache.store.as_deref() {
            if !store.trim().eq_ignore_ascii_case(MEMORY_STORE) {
                return Err(ConfigError::UnknownCacheStore {
                    value: store.to_owned(),
                });
            }
        }

        for (key, provider) in &self.providers {
            let timeout = provider.http.timeout_secs;
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("providers.{key}.http.timeout_secs"),
                    message: format!("must be a positive number of seconds, got {timeout}"),
                });
            }
        }

        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            message: format!("expected a boolean, got '{value}'"),
        }),
    }
}

fn parse_number<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|error| ConfigError::InvalidValue {
        field: field.to_owned(),
        message: format!("'{value}': {error}"),
    })
}
