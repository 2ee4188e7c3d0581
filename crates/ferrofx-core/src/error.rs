use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::http_client::{HttpError, HttpErrorKind};
use crate::ProviderId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which side of a currency pair a value was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyRole {
    Base,
    Quote,
}

impl Display for CurrencyRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Quote => f.write_str("quote"),
        }
    }
}

/// Malformed input and per-adapter pre-flight rejections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("currency code must be a 3-letter alphabetic ISO code: '{value}'")]
    InvalidCurrencyCode { value: String },
    #[error("crypto currency symbol cannot be empty")]
    EmptyCryptoSymbol,
    #[error("{provider} adapter supports only {expected} as base currency, got {actual}")]
    UnsupportedBaseCurrency {
        provider: ProviderId,
        expected: &'static str,
        actual: String,
    },
    #[error("{provider} adapter does not support crypto currencies as {role}")]
    CryptoNotSupported {
        provider: ProviderId,
        role: CurrencyRole,
    },
    #[error("rate request must include at least one quote currency")]
    EmptyQuoteList,
    #[error("conversion result does not fit the decimal range")]
    ConversionOverflow,
}

/// Wiring and configuration failures, reported at startup where possible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid provider '{value}', expected one of cbr, currency_freaks, exchange_rate_host, fake")]
    UnknownProvider { value: String },
    #[error("adapter type \"{type_name}\" not found for provider \"{provider}\"")]
    AdapterNotFound { provider: String, type_name: String },
    #[error("type \"{type_name}\" does not satisfy the rate adapter contract for provider \"{provider}\"")]
    InvalidAdapter { provider: String, type_name: String },
    #[error("adapter type \"{type_name}\" for provider \"{provider}\" has no configuration constructor")]
    MissingConstructor { provider: String, type_name: String },
    #[error("provider '{provider}' requires setting '{setting}'")]
    MissingSetting {
        provider: ProviderId,
        setting: &'static str,
    },
    #[error("unknown cache store '{value}', expected 'memory'")]
    UnknownCacheStore { value: String },
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
    #[error("unable to read configuration '{path}': {message}")]
    Unreadable { path: String, message: String },
    #[error("malformed configuration: {message}")]
    Malformed { message: String },
}

/// Classification of [`RateError`] used by callers and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateErrorKind {
    ConnectionFailure,
    RequestFailure,
    ProtocolFault,
    InvalidResponse,
    MissingResult,
    MissingDataset,
    InvalidDateTime,
    CurrencyNotFound,
    Validation,
    Configuration,
}

/// Top-level error type for rate retrieval.
///
/// Protocol clients always attach the responsible provider and keep the
/// original cause reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum RateError {
    #[error("[{provider}] Connection failed: {message}")]
    ConnectionFailure {
        provider: ProviderId,
        message: String,
        #[source]
        source: HttpError,
    },

    #[error("[{provider}] Request failed: {message}")]
    RequestFailure {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<HttpError>,
    },

    #[error("{provider} SOAP fault ({code}): {message}")]
    ProtocolFault {
        provider: ProviderId,
        code: String,
        message: String,
    },

    #[error("[{provider}] Invalid response: {message}")]
    InvalidResponse {
        provider: ProviderId,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("[{provider}] Missing SOAP result node for {action} response")]
    MissingResult { provider: ProviderId, action: String },

    #[error("[{provider}] Missing {node} dataset inside {action} response")]
    MissingDataset {
        provider: ProviderId,
        action: String,
        node: String,
    },

    #[error("[{provider}] Unable to parse {context} datetime \"{value}\"")]
    InvalidDateTime {
        provider: ProviderId,
        context: String,
        value: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Currency with code {code} was not found in the rates list")]
    CurrencyNotFound { code: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl RateError {
    /// Maps a transport failure: connect and timeout failures become
    /// `ConnectionFailure`, everything else `RequestFailure`.
    pub fn from_transport(provider: ProviderId, error: HttpError) -> Self {
        match error.kind() {
            HttpErrorKind::Connect | HttpErrorKind::Timeout => Self::ConnectionFailure {
                provider,
                message: error.message().to_owned(),
                source: error,
            },
            HttpErrorKind::Body | HttpErrorKind::Other => Self::RequestFailure {
                provider,
                status: None,
                message: error.message().to_owned(),
                source: Some(error),
            },
        }
    }

    pub fn from_status(provider: ProviderId, status: u16) -> Self {
        Self::RequestFailure {
            provider,
            status: Some(status),
            message: format!("upstream returned HTTP status {status}"),
            source: None,
        }
    }

    pub fn invalid_response(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_response_with(
        provider: ProviderId,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn currency_not_found(code: impl Into<String>) -> Self {
        Self::CurrencyNotFound { code: code.into() }
    }

    pub const fn kind(&self) -> RateErrorKind {
        match self {
            Self::ConnectionFailure { .. } => RateErrorKind::ConnectionFailure,
            Self::RequestFailure { .. } => RateErrorKind::RequestFailure,
            Self::ProtocolFault { .. } => RateErrorKind::ProtocolFault,
            Self::InvalidResponse { .. } => RateErrorKind::InvalidResponse,
            Self::MissingResult { .. } => RateErrorKind::MissingResult,
            Self::MissingDataset { .. } => RateErrorKind::MissingDataset,
            Self::InvalidDateTime { .. } => RateErrorKind::InvalidDateTime,
            Self::CurrencyNotFound { .. } => RateErrorKind::CurrencyNotFound,
            Self::Validation(_) => RateErrorKind::Validation,
            Self::Configuration(_) => RateErrorKind::Configuration,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind() {
            RateErrorKind::ConnectionFailure => "rates.connection_failure",
            RateErrorKind::RequestFailure => "rates.request_failure",
            RateErrorKind::ProtocolFault => "rates.protocol_fault",
            RateErrorKind::InvalidResponse => "rates.invalid_response",
            RateErrorKind::MissingResult => "rates.missing_result",
            RateErrorKind::MissingDataset => "rates.missing_dataset",
            RateErrorKind::InvalidDateTime => "rates.invalid_datetime",
            RateErrorKind::CurrencyNotFound => "rates.currency_not_found",
            RateErrorKind::Validation => "rates.validation",
            RateErrorKind::Configuration => "rates.configuration",
        }
    }

    /// Provider responsible for the failure, when one was involved.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::ConnectionFailure { provider, .. }
            | Self::RequestFailure { provider, .. }
            | Self::ProtocolFault { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::MissingResult { provider, .. }
            | Self::MissingDataset { provider, .. }
            | Self::InvalidDateTime { provider, .. } => Some(*provider),
            Self::Validation(
                ValidationError::UnsupportedBaseCurrency { provider, .. }
                | ValidationError::CryptoNotSupported { provider, .. },
            ) => Some(*provider),
            _ => None,
        }
    }
}
