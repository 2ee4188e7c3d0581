//! # FerroFX Core
//!
//! Provider adapters, caching and decimal conversion for foreign-exchange
//! rates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Currency identities** for ISO fiat codes and network-qualified crypto symbols
//! - **Protocol clients** for the Central Bank of Russia SOAP service and
//!   symbol-based REST providers
//! - **Adapters** that enforce per-provider currency rules and normalize rates
//! - **An adapter factory** resolving configured provider keys
//! - **A caching rate service** with deterministic cache keys
//! - **Fixed-point conversion** of amounts at a fetched rate
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (CBR, CurrencyFreaks, exchangerate.host, fake) |
//! | [`cache`] | Cache store contract and in-memory store |
//! | [`client`] | SOAP and REST protocol clients, raw DTOs |
//! | [`config`] | TOML and environment configuration |
//! | [`domain`] | Currencies, rates, snapshots, conversion |
//! | [`error`] | Validation, configuration and retrieval errors |
//! | [`factory`] | Provider key to adapter registry |
//! | [`http_client`] | HTTP client abstraction |
//! | [`retry`] | Fixed-delay retry policy |
//! | [`service`] | Cached rate retrieval and conversion |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use ferrofx_core::{Currency, RateService, RatesConfig, ReqwestHttpClient};
//! use rust_decimal_macros::dec;
//! use time::macros::date;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RatesConfig::default();
//!     let service = RateService::from_config(&config, Arc::new(ReqwestHttpClient::new()))?;
//!
//!     let amount = service
//!         .convert(
//!             Currency::fiat("RUB")?,
//!             Currency::fiat("USD")?,
//!             date!(2024 - 01 - 10),
//!             dec!(2.5),
//!         )
//!         .await?;
//!     println!("2.5 USD = {amount} RUB");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  RateService    │────▶│ RateCache        │
//! └────────┬────────┘     └──────────────────┘
//!          │ miss
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  RateAdapter    │────▶│ Protocol client  │
//! │  (per provider) │     │ (SOAP / REST)    │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       ▼
//!          │              ┌──────────────────┐
//!          │              │ HttpClient       │
//!          │              │ (reqwest/script) │
//!          ▼              └──────────────────┘
//! ┌─────────────────┐
//! │ CurrencyRate /  │
//! │ RatesOnDate     │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use ferrofx_core::{RateError, RateErrorKind};
//!
//! fn describe(error: &RateError) -> &'static str {
//!     match error.kind() {
//!         RateErrorKind::ConnectionFailure | RateErrorKind::RequestFailure => "upstream unavailable",
//!         RateErrorKind::CurrencyNotFound => "currency not published",
//!         RateErrorKind::Validation => "bad input",
//!         _ => "provider error",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API and access keys are redacted from `Debug` output and never logged
//! - Production HTTP goes through reqwest

pub mod adapters;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod factory;
pub mod http_client;
pub mod retry;
pub mod service;
pub mod source;

// Adapters
pub use adapters::{
    CbrAdapter, CurrencyFreaksAdapter, ExchangeRateHostAdapter, FakeRatesAdapter, QuoteSelection,
    RateAdapter, RateLookup, RateRequest, SymbolRatesAdapter,
};

// Caching
pub use cache::{MemoryCache, RateCache};

// Protocol clients
pub use client::{
    CbrSoapClient, CurrencyDictionaryEntry, CurrencyDictionarySnapshot, CurrencyFreaksClient,
    ExchangeRateHostClient, RateRow, RatesOnDateSnapshot, SymbolRatesClient,
};

// Configuration
pub use config::{CacheSettings, HttpSettings, ProviderConfig, RatesConfig, RetrySettings};

// Domain models
pub use domain::{
    format_decimal, CryptoCurrency, Currency, CurrencyCode, CurrencyInfo, CurrencyMetadata,
    CurrencyRate, RatesOnDate, StaticCurrencyMetadata, CONVERSION_SCALE, UNKNOWN_NUMERIC_CODE,
};

// Error types
pub use error::{ConfigError, CurrencyRole, RateError, RateErrorKind, ValidationError};

// Factory
pub use factory::{AdapterConstructor, AdapterEntry, AdapterFactory};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient, ScriptedHttpClient,
};

// Retry logic
pub use retry::RetryConfig;

// Service
pub use service::{Conversion, RateService};

// Source identifiers
pub use source::ProviderId;
