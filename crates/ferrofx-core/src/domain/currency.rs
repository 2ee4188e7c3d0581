use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const CODE_LEN: usize = 3;

/// Normalized 3-letter fiat currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalize a code to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.chars().count() == CODE_LEN
            && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

        if !valid {
            return Err(ValidationError::InvalidCurrencyCode {
                value: input.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// Crypto asset identified by its symbol and, optionally, the network it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CryptoCurrencyParts")]
pub struct CryptoCurrency {
    symbol: String,
    network: Option<String>,
}

#[derive(Deserialize)]
struct CryptoCurrencyParts {
    symbol: String,
    network: Option<String>,
}

impl TryFrom<CryptoCurrencyParts> for CryptoCurrency {
    type Error = ValidationError;

    fn try_from(parts: CryptoCurrencyParts) -> Result<Self, Self::Error> {
        Self::new(&parts.symbol, parts.network.as_deref())
    }
}

impl CryptoCurrency {
    /// Symbol is uppercased, network lowercased; a blank network counts as absent.
    pub fn new(symbol: &str, network: Option<&str>) -> Result<Self, ValidationError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::EmptyCryptoSymbol);
        }

        let network = network
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        Ok(Self { symbol, network })
    }

    /// Parses `SYMBOL@network` or a bare `SYMBOL`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.split_once('@') {
            Some((symbol, network)) => Self::new(symbol, Some(network)),
            None => Self::new(input, None),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }
}

impl Display for CryptoCurrency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.network {
            Some(network) => write!(f, "{}@{}", self.symbol, network),
            None => f.write_str(&self.symbol),
        }
    }
}

/// Either a fiat code or a crypto asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Fiat(CurrencyCode),
    Crypto(CryptoCurrency),
}

impl Currency {
    pub fn fiat(code: &str) -> Result<Self, ValidationError> {
        CurrencyCode::parse(code).map(Self::Fiat)
    }

    pub fn crypto(symbol: &str, network: Option<&str>) -> Result<Self, ValidationError> {
        CryptoCurrency::new(symbol, network).map(Self::Crypto)
    }

    /// Canonical string code: `USD`, `USDT@tron` or `BTC`.
    pub fn code(&self) -> String {
        self.to_string()
    }

    /// Structural equality: fiat matches fiat by code, crypto matches crypto by
    /// symbol and network.
    pub fn same_as(&self, other: &Currency) -> bool {
        self == other
    }

    pub fn as_fiat(&self) -> Option<&CurrencyCode> {
        match self {
            Self::Fiat(code) => Some(code),
            Self::Crypto(_) => None,
        }
    }

    pub const fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fiat(code) => Display::fmt(code, f),
            Self::Crypto(crypto) => Display::fmt(crypto, f),
        }
    }
}

/// Entry-boundary normalization: `@` marks a crypto identifier, anything else
/// must be a 3-letter fiat code.
impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.contains('@') {
            CryptoCurrency::parse(value).map(Self::Crypto)
        } else {
            Self::fiat(value)
        }
    }
}

impl From<CurrencyCode> for Currency {
    fn from(value: CurrencyCode) -> Self {
        Self::Fiat(value)
    }
}

impl From<CryptoCurrency> for Currency {
    fn from(value: CryptoCurrency) -> Self {
        Self::Crypto(value)
    }
}
