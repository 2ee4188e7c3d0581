use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Canonical provider identifiers used in errors, logs and factory lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Cbr,
    CurrencyFreaks,
    ExchangeRateHost,
    Fake,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [
        Self::Cbr,
        Self::CurrencyFreaks,
        Self::ExchangeRateHost,
        Self::Fake,
    ];

    /// Configuration key, e.g. `currency_freaks`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cbr => "cbr",
            Self::CurrencyFreaks => "currency_freaks",
            Self::ExchangeRateHost => "exchange_rate_host",
            Self::Fake => "fake",
        }
    }

    /// Human-facing provider name used in error messages.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cbr => "CBR",
            Self::CurrencyFreaks => "CurrencyFreaks",
            Self::ExchangeRateHost => "ExchangeRateHost",
            Self::Fake => "Fake",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownProvider {
                value: value.to_owned(),
            })
    }
}
