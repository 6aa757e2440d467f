//! Currency table and rate snapshot
//!
//! Rates are a point-in-time cache expressed against the base currency:
//! a rate of 18.50 for USD means one dollar is worth R18.50.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// The base currency every rate is expressed against
pub const BASE_CURRENCY: &str = "ZAR";

/// A currency with its rate snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code, uppercase
    pub code: String,
    pub symbol: String,
    pub name: String,
    /// Value of one unit in the base currency
    pub rate_to_base: f64,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u8,
}

fn default_decimal_places() -> u8 {
    2
}

impl Currency {
    pub fn new(code: &str, symbol: &str, name: &str, rate_to_base: f64, decimal_places: u8) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            rate_to_base,
            decimal_places,
        }
    }

    /// Format an amount expressed in this currency
    pub fn format(&self, amount: Money) -> String {
        amount.format_with(&self.symbol, self.decimal_places)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.code, self.symbol, self.name)
    }
}

/// The persisted currency configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Base currency; its rate is always 1
    pub base: String,

    /// Currency used for new imports and for report output
    #[serde(default = "default_code")]
    pub default_code: String,

    /// Known currencies, in display order
    pub currencies: Vec<Currency>,

    /// When the rate snapshot was last changed
    pub updated_at: DateTime<Utc>,
}

fn default_code() -> String {
    BASE_CURRENCY.to_string()
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base: BASE_CURRENCY.to_string(),
            default_code: BASE_CURRENCY.to_string(),
            currencies: vec![
                Currency::new("ZAR", "R", "South African Rand", 1.0, 2),
                Currency::new("USD", "$", "US Dollar", 18.50, 2),
                Currency::new("EUR", "€", "Euro", 20.25, 2),
                Currency::new("GBP", "£", "British Pound", 23.75, 2),
                Currency::new("JPY", "¥", "Japanese Yen", 0.124, 0),
                Currency::new("CNY", "¥", "Chinese Yuan", 2.55, 2),
            ],
            updated_at: Utc::now(),
        }
    }
}

impl CurrencyConfig {
    /// Look up a currency by code (case-insensitive)
    pub fn get(&self, code: &str) -> Option<&Currency> {
        let code = code.trim();
        self.currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Currency> {
        let code = code.trim();
        self.currencies
            .iter_mut()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// The currency reports are rendered in
    pub fn default_currency(&self) -> Option<&Currency> {
        self.get(&self.default_code)
    }

    /// Whether `code` is the base currency
    pub fn is_base(&self, code: &str) -> bool {
        self.base.eq_ignore_ascii_case(code.trim())
    }

    /// Convert an amount in `code` to the base currency
    ///
    /// Returns `None` for an unknown currency.
    pub fn to_base(&self, amount: Money, code: &str) -> Option<Money> {
        if self.is_base(code) {
            return Some(amount);
        }
        let currency = self.get(code)?;
        Some(Money::from_f64(amount.as_f64() * currency.rate_to_base))
    }

    /// Convert an amount between any two known currencies via the base
    pub fn convert(&self, amount: Money, from: &str, to: &str) -> Option<Money> {
        let from_rate = self.get(from)?.rate_to_base;
        let to_rate = self.get(to)?.rate_to_base;
        if from.trim().eq_ignore_ascii_case(to.trim()) {
            return Some(amount);
        }
        if to_rate <= 0.0 {
            return None;
        }
        Some(Money::from_f64(amount.as_f64() * from_rate / to_rate))
    }

    /// Format an amount in the given currency; unknown codes fall back to the code as prefix
    pub fn format(&self, amount: Money, code: &str) -> String {
        match self.get(code) {
            Some(currency) => currency.format(amount),
            None => format!("{} {}", code.trim().to_uppercase(), amount.format_with("", 2)),
        }
    }

    /// Format a base-currency amount in the default currency
    pub fn format_default(&self, base_amount: Money) -> String {
        let code = self.default_code.clone();
        match self.convert(base_amount, &self.base, &code) {
            Some(converted) => self.format(converted, &code),
            None => self.format(base_amount, &self.base),
        }
    }
}
