//! Rate retrieval with an optional cache in front of the adapter.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::adapters::{RateAdapter, RateLookup, RateRequest};
use crate::cache::{MemoryCache, RateCache};
use crate::config::{RatesConfig, DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_TTL_SECS, MEMORY_STORE};
use crate::factory::AdapterFactory;
use crate::http_client::HttpClient;
use crate::{format_decimal, ConfigError, Currency, CurrencyRate, ProviderId, RateError};

/// Outcome of converting an amount at a fetched rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub rate: CurrencyRate,
    pub amount: Decimal,
    pub result: Decimal,
}

/// Front door for rate lookups.
///
/// With a cache attached, each request is a lookup under a deterministic key,
/// an adapter call on a miss and a store of the successful result. There is
/// no single-flight guard: concurrent misses on the same key each reach the
/// adapter, and the last store wins.
#[derive(Clone)]
pub struct RateService {
    adapter: Arc<dyn RateAdapter>,
    cache: Option<Arc<dyn RateCache>>,
    ttl: Duration,
    prefix: String,
}

impl RateService {
    /// Uncached service; every call reaches the adapter.
    pub fn new(adapter: Arc<dyn RateAdapter>) -> Self {
        Self {
            adapter,
            cache: None,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            prefix: String::from(DEFAULT_CACHE_PREFIX),
        }
    }

    /// Enables caching; `ttl` is raised to at least one second.
    pub fn with_cache(mut self, cache: Arc<dyn RateCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.ttl = ttl.max(Duration::from_secs(1));
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Builds the adapter for the configured provider with the built-in
    /// registry.
    pub fn from_config(config: &RatesConfig, http: Arc<dyn HttpClient>) -> Result<Self, ConfigError> {
        Self::from_config_with(config, &AdapterFactory::with_defaults(), http)
    }

    pub fn from_config_with(
        config: &RatesConfig,
        factory: &AdapterFactory,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        config.validate(factory)?;

        let adapter = factory.create(&config.provider, &config.selected_provider(), http)?;
        let service = Self::new(adapter).with_prefix(config.cache.prefix.clone());

        if !config.cache.enabled {
            return Ok(service);
        }

        let cache: Arc<dyn RateCache> = match config.cache.store.as_deref() {
            None => Arc::new(MemoryCache::new()),
            Some(store) if store.trim().eq_ignore_ascii_case(MEMORY_STORE) => {
                Arc::new(MemoryCache::new())
            }
            Some(store) => {
                return Err(ConfigError::UnknownCacheStore {
                    value: store.to_owned(),
                })
            }
        };

        Ok(service.with_cache(cache, config.cache.ttl()))
    }

    pub fn provider(&self) -> ProviderId {
        self.adapter.provider()
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// `{prefix}_{YYYYMMDD}_{BASE}_{sorted-quotes}`.
    pub fn cache_key(&self, request: &RateRequest) -> String {
        format!("{}_{}", self.prefix, request.key_fragment())
    }

    pub async fn rates(&self, request: &RateRequest) -> Result<RateLookup, RateError> {
        let Some(cache) = self.cache.as_deref() else {
            return self.adapter.rates(request).await;
        };

        let key = self.cache_key(request);
        if let Some(lookup) = cached_lookup(cache, &key, request).await {
            tracing::debug!(key = %key, "rate cache hit");
            return Ok(lookup);
        }

        tracing::debug!(key = %key, provider = %self.provider(), "rate cache miss");
        let lookup = self.adapter.rates(request).await?;
        self.store(cache, key, &lookup).await;

        Ok(lookup)
    }

    pub async fn rate(
        &self,
        base: Currency,
        quote: Currency,
        date: Date,
    ) -> Result<CurrencyRate, RateError> {
        let request = RateRequest::single(base, quote, date);
        let lookup = self.rates(&request).await?;

        lookup.into_single().ok_or_else(|| {
            RateError::invalid_response(
                self.provider(),
                "adapter returned a rate list for a single-quote request",
            )
        })
    }

    /// Rates for every quote found, in request order.
    pub async fn rate_list(
        &self,
        base: Currency,
        quotes: Vec<Currency>,
        date: Date,
    ) -> Result<Vec<CurrencyRate>, RateError> {
        let request = RateRequest::many(base, quotes, date)?;
        Ok(self.rates(&request).await?.into_rates())
    }

    pub async fn conversion(
        &self,
        base: Currency,
        quote: Currency,
        date: Date,
        amount: Decimal,
    ) -> Result<Conversion, RateError> {
        let rate = self.rate(base, quote, date).await?;
        let result = rate.convert(amount)?;

        Ok(Conversion {
            rate,
            amount,
            result,
        })
    }

    /// Converted amount as a normalized decimal string.
    pub async fn convert(
        &self,
        base: Currency,
        quote: Currency,
        date: Date,
        amount: Decimal,
    ) -> Result<String, RateError> {
        let conversion = self.conversion(base, quote, date, amount).await?;
        Ok(format_decimal(conversion.result))
    }

    async fn store(&self, cache: &dyn RateCache, key: String, lookup: &RateLookup) {
        match serde_json::to_string(lookup) {
            Ok(value) => cache.put(key, value, self.ttl).await,
            Err(error) => tracing::warn!(key = %key, %error, "unable to encode rates for cache"),
        }
    }
}

/// Decoded entry for `key` in the request's shape. Single requests and
/// one-element lists share a key, so either stored shape can answer either
/// request; undecodable entries and entries missing the quote count as a miss.
async fn cached_lookup(cache: &dyn RateCache, key: &str, request: &RateRequest) -> Option<RateLookup> {
    let raw = cache.get(key).await?;

    match serde_json::from_str::<RateLookup>(&raw) {
        Ok(lookup) => {
            let reshaped = lookup.reshaped_for(&request.quotes);
            if reshaped.is_none() {
                tracing::warn!(key = %key, "cached rates do not cover the request");
            }
            reshaped
        }
        Err(error) => {
            tracing::warn!(key = %key, %error, "unable to decode cached rates");
            None
        }
    }
}
