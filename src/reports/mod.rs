//! Reports over the transaction ledger
//!
//! Every report reads active transactions for a period, converts amounts to
//! the base currency and groups them with the shared aggregation engine.
//! Reports render as terminal text; the category breakdown also exports CSV.

pub mod aggregate;
pub mod breakdown;
pub mod budget;
pub mod entity;
pub mod summary;
pub mod tax;

pub use aggregate::{percent_of, savings_rate, Aggregation, Bucket, GroupKey};
pub use breakdown::CategoryBreakdown;
pub use budget::BudgetReport;
pub use entity::{EntityReport, EntityRow};
pub use summary::MonthlySummary;
pub use tax::TaxReport;

use crate::error::DashboardResult;
use crate::models::{CurrencyConfig, Money, Period, Transaction};
use crate::services::currency::amount_in_base;
use crate::storage::Storage;

/// Active transactions of a period paired with their base-currency amount
pub(crate) struct PeriodLedger {
    pub(crate) currencies: CurrencyConfig,
    pub(crate) rows: Vec<(Transaction, Money)>,
}

impl PeriodLedger {
    pub(crate) fn load(storage: &Storage, period: &Period) -> DashboardResult<Self> {
        let currencies = storage.currencies.get()?;
        let rows = storage
            .transactions
            .get_by_date_range(period.start_date(), period.end_date())?
            .into_iter()
            .map(|t| {
                let amount = amount_in_base(&currencies, &t);
                (t, amount)
            })
            .collect();
        Ok(Self { currencies, rows })
    }

    /// Expenses as positive magnitudes
    pub(crate) fn expenses(&self) -> impl Iterator<Item = (&Transaction, Money)> {
        self.rows
            .iter()
            .filter(|(_, amount)| amount.is_negative())
            .map(|(t, amount)| (t, amount.abs()))
    }

    pub(crate) fn income(&self) -> impl Iterator<Item = (&Transaction, Money)> {
        self.rows
            .iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|(t, amount)| (t, *amount))
    }

    pub(crate) fn total_income(&self) -> Money {
        self.income().map(|(_, a)| a).sum()
    }

    pub(crate) fn total_expenses(&self) -> Money {
        self.expenses().map(|(_, a)| a).sum()
    }
}

/// Format a savings rate or other optional percentage
pub fn format_optional_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "N/A".to_string(),
    }
}
