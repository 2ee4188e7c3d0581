use ferrofx_core::{ConfigError, RateError, RateErrorKind, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::InvalidArgument(_) => 2,
            Self::Config(_) => 3,
            Self::Rate(error) => match error.kind() {
                RateErrorKind::Validation => 2,
                RateErrorKind::Configuration => 3,
                RateErrorKind::CurrencyNotFound => 4,
                RateErrorKind::ConnectionFailure | RateErrorKind::RequestFailure => 5,
                RateErrorKind::ProtocolFault
                | RateErrorKind::InvalidResponse
                | RateErrorKind::MissingResult
                | RateErrorKind::MissingDataset
                | RateErrorKind::InvalidDateTime => 6,
            },
            Self::Serialization(_) | Self::Format(_) => 8,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use ferrofx_core::ProviderId;

    use super::*;

    #[test]
    fn rate_errors_map_by_kind() {
        let not_found = CliError::from(RateError::currency_not_found("GBP"));
        let unavailable = CliError::from(RateError::from_status(ProviderId::Cbr, 503));
        let fault = CliError::from(RateError::ProtocolFault {
            provider: ProviderId::Cbr,
            code: String::from("soap:Server"),
            message: String::from("boom"),
        });

        assert_eq!(not_found.exit_code(), 4);
        assert_eq!(unavailable.exit_code(), 5);
        assert_eq!(fault.exit_code(), 6);
    }

    #[test]
    fn input_and_config_errors_have_their_own_codes() {
        let invalid = CliError::from(ValidationError::EmptyQuoteList);
        let config = CliError::from(ConfigError::UnknownCacheStore {
            value: String::from("redis"),
        });

        assert_eq!(invalid.exit_code(), 2);
        assert_eq!(config.exit_code(), 3);
    }
}
