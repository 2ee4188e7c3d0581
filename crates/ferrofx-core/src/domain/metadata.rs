use std::collections::HashMap;

/// Display name and ISO numeric code of a currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub name: String,
    pub numeric_code: String,
}

impl CurrencyInfo {
    pub fn new(name: impl Into<String>, numeric_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            numeric_code: numeric_code.into(),
        }
    }
}

/// Lookup of currency names and numeric codes used to enrich rates from
/// providers that publish bare codes only.
pub trait CurrencyMetadata: Send + Sync {
    fn lookup(&self, code: &str) -> Option<CurrencyInfo>;
}

/// In-memory metadata table keyed by uppercase code.
#[derive(Debug, Clone, Default)]
pub struct StaticCurrencyMetadata {
    entries: HashMap<String, CurrencyInfo>,
}

impl StaticCurrencyMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the most traded currencies.
    pub fn common() -> Self {
        [
            ("AED", "UAE Dirham", "784"),
            ("AUD", "Australian Dollar", "036"),
            ("BYN", "Belarusian Ruble", "933"),
            ("CAD", "Canadian Dollar", "124"),
            ("CHF", "Swiss Franc", "756"),
            ("CNY", "Yuan Renminbi", "156"),
            ("CZK", "Czech Koruna", "203"),
            ("EUR", "Euro", "978"),
            ("GBP", "Pound Sterling", "826"),
            ("HKD", "Hong Kong Dollar", "344"),
            ("INR", "Indian Rupee", "356"),
            ("JPY", "Yen", "392"),
            ("KRW", "Won", "410"),
            ("KZT", "Tenge", "398"),
            ("NOK", "Norwegian Krone", "578"),
            ("PLN", "Zloty", "985"),
            ("RUB", "Russian Ruble", "643"),
            ("SEK", "Swedish Krona", "752"),
            ("SGD", "Singapore Dollar", "702"),
            ("TRY", "Turkish Lira", "949"),
            ("UAH", "Hryvnia", "980"),
            ("USD", "US Dollar", "840"),
        ]
        .into_iter()
        .fold(Self::new(), |table, (code, name, numeric)| {
            table.with(code, name, numeric)
        })
    }

    pub fn with(
        mut self,
        code: &str,
        name: impl Into<String>,
        numeric_code: impl Into<String>,
    ) -> Self {
        self.insert(code, CurrencyInfo::new(name, numeric_code));
        self
    }

    pub fn insert(&mut self, code: &str, info: CurrencyInfo) {
        self.entries.insert(code.trim().to_ascii_uppercase(), info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CurrencyMetadata for StaticCurrencyMetadata {
    fn lookup(&self, code: &str) -> Option<CurrencyInfo> {
        self.entries.get(&code.trim().to_ascii_uppercase()).cloned()
    }
}
