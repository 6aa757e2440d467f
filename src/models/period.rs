//! Reporting and budget period representation
//!
//! Supports calendar months, calendar years, South African tax years
//! (1 March to the end of February) and custom date ranges.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a reporting or budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Period {
    /// Calendar month (e.g., "2025-01")
    Month { year: i32, month: u32 },

    /// Calendar year (e.g., "2025")
    Year { year: i32 },

    /// Tax year identified by the year it ends in (e.g., "TY2025" = 2024-03-01..2025-02-28)
    TaxYear { ending: i32 },

    /// Custom inclusive date range
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Create a monthly period
    pub fn month(year: i32, month: u32) -> Self {
        Self::Month { year, month }
    }

    /// Create a tax-year period
    pub fn tax_year(ending: i32) -> Self {
        Self::TaxYear { ending }
    }

    /// The month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The tax year containing `date`
    pub fn tax_year_of(date: NaiveDate) -> Self {
        let ending = if date.month() >= 3 {
            date.year() + 1
        } else {
            date.year()
        };
        Self::TaxYear { ending }
    }

    /// Get the current monthly period
    pub fn current_month() -> Self {
        Self::month_of(chrono::Local::now().date_naive())
    }

    /// Get the current tax year
    pub fn current_tax_year() -> Self {
        Self::tax_year_of(chrono::Local::now().date_naive())
    }

    /// Get the start date of this period
    pub fn start_date(&self) -> NaiveDate {
        match *self {
            Self::Month { year, month } => first_of_month(year, month),
            Self::Year { year } => first_of_month(year, 1),
            Self::TaxYear { ending } => first_of_month(ending - 1, 3),
            Self::Custom { start, .. } => start,
        }
    }

    /// Get the end date of this period (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        match *self {
            Self::Month { year, month } => {
                let (next_year, next_month) = if month >= 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                first_of_month(next_year, next_month) - Duration::days(1)
            }
            Self::Year { year } => first_of_month(year + 1, 1) - Duration::days(1),
            Self::TaxYear { ending } => first_of_month(ending, 3) - Duration::days(1),
            Self::Custom { end, .. } => end,
        }
    }

    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Get the next period of the same shape
    pub fn next(&self) -> Self {
        match *self {
            Self::Month { year, month } => {
                if month >= 12 {
                    Self::Month {
                        year: year + 1,
                        month: 1,
                    }
                } else {
                    Self::Month {
                        year,
                        month: month + 1,
                    }
                }
            }
            Self::Year { year } => Self::Year { year: year + 1 },
            Self::TaxYear { ending } => Self::TaxYear { ending: ending + 1 },
            Self::Custom { start, end } => {
                let duration = end - start;
                Self::Custom {
                    start: end + Duration::days(1),
                    end: end + duration + Duration::days(1),
                }
            }
        }
    }

    /// Get the previous period of the same shape
    pub fn prev(&self) -> Self {
        match *self {
            Self::Month { year, month } => {
                if month <= 1 {
                    Self::Month {
                        year: year - 1,
                        month: 12,
                    }
                } else {
                    Self::Month {
                        year,
                        month: month - 1,
                    }
                }
            }
            Self::Year { year } => Self::Year { year: year - 1 },
            Self::TaxYear { ending } => Self::TaxYear { ending: ending - 1 },
            Self::Custom { start, end } => {
                let duration = end - start;
                Self::Custom {
                    start: start - duration - Duration::days(1),
                    end: start - Duration::days(1),
                }
            }
        }
    }

    /// Parse a period string
    ///
    /// Formats:
    /// - Month: "2025-01"
    /// - Year: "2025"
    /// - Tax year: "TY2025" (ends February 2025)
    /// - Custom: "2025-01-01..2025-01-15"
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let s = s.trim();

        if let Some((start, end)) = s.split_once("..") {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            if end < start {
                return Err(PeriodParseError::InvalidRange(s.to_string()));
            }
            return Ok(Self::Custom { start, end });
        }

        if let Some(rest) = s.strip_prefix("TY").or_else(|| s.strip_prefix("ty")) {
            let ending = parse_year(rest, s)?;
            return Ok(Self::TaxYear { ending });
        }

        if let Some((year, month)) = s.split_once('-') {
            let year = parse_year(year, s)?;
            let month: u32 = month
                .parse()
                .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
            if !(1..=12).contains(&month) {
                return Err(PeriodParseError::InvalidMonth(month));
            }
            return Ok(Self::Month { year, month });
        }

        Ok(Self::Year {
            year: parse_year(s, s)?,
        })
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn parse_year(s: &str, whole: &str) -> Result<i32, PeriodParseError> {
    let s = s.trim();
    if s.len() != 4 {
        return Err(PeriodParseError::InvalidFormat(whole.to_string()));
    }
    s.parse()
        .map_err(|_| PeriodParseError::InvalidFormat(whole.to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDate, PeriodParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| PeriodParseError::InvalidFormat(s.trim().to_string()))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::Year { year } => write!(f, "{:04}", year),
            Self::TaxYear { ending } => write!(f, "TY{:04}", ending),
            Self::Custom { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

/// Error type for period parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
    InvalidRange(String),
}

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(
                f,
                "Invalid period '{}': use YYYY-MM, YYYY, TYYYYY or YYYY-MM-DD..YYYY-MM-DD",
                s
            ),
            Self::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
            Self::InvalidRange(s) => write!(f, "Period ends before it starts: {}", s),
        }
    }
}

impl std::error::Error for PeriodParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let p = Period::month(2024, 2);
        assert_eq!(p.start_date(), date(2024, 2, 1));
        assert_eq!(p.end_date(), date(2024, 2, 29));

        let dec = Period::month(2024, 12);
        assert_eq!(dec.end_date(), date(2024, 12, 31));
    }

    #[test]
    fn test_tax_year_bounds() {
        let ty = Period::tax_year(2025);
        assert_eq!(ty.start_date(), date(2024, 3, 1));
        assert_eq!(ty.end_date(), date(2025, 2, 28));

        let leap = Period::tax_year(2024);
        assert_eq!(leap.end_date(), date(2024, 2, 29));
    }

    #[test]
    fn test_tax_year_of() {
        assert_eq!(Period::tax_year_of(date(2024, 11, 3)), Period::tax_year(2025));
        assert_eq!(Period::tax_year_of(date(2025, 2, 28)), Period::tax_year(2025));
        assert_eq!(Period::tax_year_of(date(2025, 3, 1)), Period::tax_year(2026));
    }

    #[test]
    fn test_contains() {
        let p = Period::month(2024, 11);
        assert!(p.contains(date(2024, 11, 3)));
        assert!(!p.contains(date(2024, 12, 1)));
    }

    #[test]
    fn test_next_prev() {
        assert_eq!(Period::month(2024, 12).next(), Period::month(2025, 1));
        assert_eq!(Period::month(2025, 1).prev(), Period::month(2024, 12));
        assert_eq!(Period::tax_year(2025).next(), Period::tax_year(2026));

        let custom = Period::Custom {
            start: date(2025, 1, 1),
            end: date(2025, 1, 10),
        };
        assert_eq!(custom.next().start_date(), date(2025, 1, 11));
        assert_eq!(custom.next().prev(), custom);
    }

    #[test]
    fn test_parse_and_display() {
        for s in ["2025-01", "2025", "TY2025", "2025-01-01..2025-01-15"] {
            assert_eq!(Period::parse(s).unwrap().to_string(), s);
        }
        assert_eq!(Period::parse("ty2024").unwrap(), Period::tax_year(2024));
        assert_eq!(Period::parse("2025-13"), Err(PeriodParseError::InvalidMonth(13)));
        assert!(Period::parse("2025-02-01..2025-01-01").is_err());
        assert!(Period::parse("nonsense").is_err());
    }
}
