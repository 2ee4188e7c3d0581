//! # Domain Models
//!
//! Currency identities, published rates and the conversion rule.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CurrencyCode`] | Validated 3-letter fiat code |
//! | [`CryptoCurrency`] | Crypto symbol with optional network |
//! | [`Currency`] | Fiat or crypto currency |
//! | [`CurrencyRate`] | One published rate with nominal and unit rate |
//! | [`RatesOnDate`] | Dated snapshot indexed by currency code |
//! | [`CurrencyMetadata`] | Name and numeric code lookup |
//!
//! All types validate at construction and are immutable afterwards:
//!
//! ```rust
//! use ferrofx_core::{CurrencyCode, ValidationError};
//!
//! let usd = CurrencyCode::parse(" usd ").unwrap();
//! assert_eq!(usd.as_str(), "USD");
//!
//! let invalid = CurrencyCode::parse("USDT");
//! assert!(matches!(invalid, Err(ValidationError::InvalidCurrencyCode { .. })));
//! ```

pub mod conversion;
mod currency;
mod metadata;
mod rate;

pub use conversion::{format_decimal, CONVERSION_SCALE};
pub use currency::{CryptoCurrency, Currency, CurrencyCode};
pub use metadata::{CurrencyInfo, CurrencyMetadata, StaticCurrencyMetadata};
pub use rate::{CurrencyRate, RatesOnDate, UNKNOWN_NUMERIC_CODE};
