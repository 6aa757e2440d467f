//! Money type for representing currency amounts
//!
//! Internally stores amounts in cents (i64) to avoid floating-point precision
//! issues. Provides safe arithmetic operations and formatting with thousands
//! separators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Symbol used by `Display`, matching the base currency
pub const BASE_SYMBOL: &str = "R";

/// Largest magnitude `parse` accepts: R1 trillion, in cents
///
/// Keeps sums of parsed amounts far inside `i64`.
pub const MAX_PARSED_CENTS: i64 = 100_000_000_000_000;

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use inout_cli::models::Money;
    /// let amount = Money::from_cents(1050); // R10.50
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole units (rands, dollars, ...)
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Create a Money amount from a floating-point unit value, rounding half away from zero
    pub fn from_f64(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole-unit portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Get the amount as a floating-point unit value
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is positive
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Get the absolute value
    pub const fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Multiply by a rate in basis points, rounding half up to the cent
    pub fn apply_basis_points(&self, bps: u32) -> Self {
        let product = self.0 as i128 * bps as i128;
        let rounded = if product >= 0 {
            (product + 5_000) / 10_000
        } else {
            (product - 5_000) / 10_000
        };
        Self(rounded as i64)
    }

    /// The smaller of two amounts
    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// The larger of two amounts
    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// Ratio of this amount to `total`, or `None` when `total` is zero
    pub fn ratio_of(&self, total: Money) -> Option<f64> {
        if total.is_zero() {
            None
        } else {
            Some(self.0 as f64 / total.0 as f64)
        }
    }

    /// Parse a money amount from a string
    ///
    /// Accepts formats: "10.50", "-10.50", "R10.50", "-R1,234.50", "R 1 234", "10".
    /// At most one sign and two decimal places; magnitudes above
    /// [`MAX_PARSED_CENTS`] are out of range.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let original = s;
        let invalid = || MoneyParseError::InvalidFormat(original.to_string());
        let s = s.trim();

        let (sign, s) = match s.strip_prefix('-') {
            Some(stripped) => (Some(true), stripped),
            None => match s.strip_prefix('+') {
                Some(stripped) => (Some(false), stripped),
                None => (None, s),
            },
        };

        let s = s
            .trim_start_matches(|c: char| c.is_alphabetic() || "$€£¥".contains(c))
            .trim();

        // Symbol before the sign, e.g. "R-450.00"
        let (negative, s) = match (sign, s.strip_prefix('-')) {
            (None, Some(stripped)) => (true, stripped),
            (Some(_), Some(_)) => return Err(invalid()),
            (sign, None) => (sign.unwrap_or(false), s),
        };
        if s.starts_with('-') || s.starts_with('+') {
            return Err(invalid());
        }

        let cleaned: String = s.chars().filter(|c| *c != ',' && *c != ' ').collect();
        if cleaned.is_empty() {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }

        let cents = if let Some((whole, frac)) = cleaned.split_once('.') {
            if frac.contains('.') {
                return Err(MoneyParseError::InvalidFormat(original.to_string()));
            }

            let units: i64 = if whole.is_empty() {
                0
            } else {
                whole
                    .parse()
                    .map_err(|_| MoneyParseError::InvalidFormat(original.to_string()))?
            };

            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(MoneyParseError::InvalidFormat(original.to_string()));
            }

            let cents: i64 = match frac.len() {
                0 => 0,
                1 => frac.parse::<i64>().unwrap_or(0) * 10,
                2 => frac.parse().unwrap_or(0),
                _ => return Err(invalid()),
            };

            units
                .checked_mul(100)
                .and_then(|v| v.checked_add(cents))
                .ok_or_else(|| MoneyParseError::OutOfRange(original.to_string()))?
        } else {
            cleaned
                .parse::<i64>()
                .map_err(|_| MoneyParseError::InvalidFormat(original.to_string()))?
                .checked_mul(100)
                .ok_or_else(|| MoneyParseError::OutOfRange(original.to_string()))?
        };

        if cents > MAX_PARSED_CENTS {
            return Err(MoneyParseError::OutOfRange(original.to_string()));
        }

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Two-decimal amount without symbol or separators, e.g. `-1234.50`
    pub fn to_plain_string(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }

    /// Format with a currency symbol, two decimals and thousands separators
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        self.format_with(symbol, 2)
    }

    /// Format with a currency symbol and the given number of decimal places (0-2)
    ///
    /// Whole-unit rendering rounds half away from zero.
    pub fn format_with(&self, symbol: &str, decimal_places: u8) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();

        let body = match decimal_places {
            0 => group_thousands((abs + 50) / 100),
            1 => {
                let tenths = (abs + 5) / 10;
                format!("{}.{}", group_thousands(tenths / 10), tenths % 10)
            }
            _ => format!("{}.{:02}", group_thousands(abs / 100), abs % 100),
        };

        format!("{}{}{}", sign, symbol, body)
    }
}

/// Insert a comma between every group of three digits
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_symbol(BASE_SYMBOL))
    }
}

// Arithmetic saturates at the i64 bounds rather than wrapping or panicking

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::OutOfRange(s) => write!(f, "Amount out of range: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.cents(), 1050);
        assert_eq!(m.units(), 10);
    }

    #[test]
    fn test_display_uses_thousands_separators() {
        assert_eq!(Money::from_cents(1050).to_string(), "R10.50");
        assert_eq!(Money::from_cents(0).to_string(), "R0.00");
        assert_eq!(Money::from_cents(-45000).to_string(), "-R450.00");
        assert_eq!(Money::from_cents(123456789).to_string(), "R1,234,567.89");
        assert_eq!(Money::from_cents(100000).to_string(), "R1,000.00");
        assert_eq!(Money::from_cents(5).to_string(), "R0.05");
    }

    #[test]
    fn test_format_with_decimals() {
        let m = Money::from_cents(123450);
        assert_eq!(m.format_with("¥", 0), "¥1,235");
        assert_eq!(m.format_with("$", 2), "$1,234.50");
        assert_eq!(Money::from_cents(-99).format_with("€", 0), "-€1");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(a.min(b), b);
        assert_eq!(a.max(b), a);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("R10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-450.00").unwrap().cents(), -45000);
        assert_eq!(Money::parse("-R1,234.50").unwrap().cents(), -123450);
        assert_eq!(Money::parse("R-12.00").unwrap().cents(), -1200);
        assert_eq!(Money::parse("R 1 234").unwrap().cents(), 123400);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse(".75").unwrap().cents(), 75);
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
    }

    #[test]
    fn test_parse_rejects_doubled_sign() {
        assert!(Money::parse("--450").is_err());
        assert!(Money::parse("-R-450").is_err());
        assert!(Money::parse("+-450").is_err());
        assert_eq!(Money::parse("+R450").unwrap().cents(), 45000);
    }

    #[test]
    fn test_parse_rejects_extra_decimals() {
        assert!(Money::parse("1.999").is_err());
        assert_eq!(Money::parse("1.99").unwrap().cents(), 199);
    }

    #[test]
    fn test_parse_bounds_magnitude() {
        assert_eq!(
            Money::parse("1000000000000.00").unwrap().cents(),
            MAX_PARSED_CENTS
        );
        assert!(matches!(
            Money::parse("90000000000000000.00"),
            Err(MoneyParseError::OutOfRange(_))
        ));
        assert!(matches!(
            Money::parse("-1000000000000.01"),
            Err(MoneyParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let big = Money::from_cents(i64::MAX - 1);
        assert_eq!((big + Money::from_cents(10)).cents(), i64::MAX);
        let total: Money = vec![big, big, big].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
        assert_eq!((-Money::from_cents(i64::MIN)).cents(), i64::MAX);
    }

    #[test]
    fn test_apply_basis_points() {
        // 18% of R237,100
        assert_eq!(
            Money::from_units(237_100).apply_basis_points(1_800),
            Money::from_units(42_678)
        );
        // half-up rounding: 1 cent * 50% = 0.5c -> 1c
        assert_eq!(Money::from_cents(1).apply_basis_points(5_000).cents(), 1);
    }

    #[test]
    fn test_ratio_of() {
        let part = Money::from_cents(-300);
        assert_eq!(part.ratio_of(Money::from_cents(-600)), Some(0.5));
        assert_eq!(part.ratio_of(Money::zero()), None);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![
            Money::from_cents(100),
            Money::from_cents(200),
            Money::from_cents(300),
        ];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");

        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, deserialized);
    }
}
