//! Monthly summary report
//!
//! Income, expenses, net result, savings rate and the top spending
//! categories for one period.

use crate::display::report::{format_bar, format_header, separator};
use crate::error::DashboardResult;
use crate::models::{CurrencyConfig, Money, Period};
use crate::storage::Storage;

use super::aggregate::{savings_rate, Aggregation, Bucket, GroupKey};
use super::{format_optional_percent, PeriodLedger};

const WIDTH: usize = 64;

#[derive(Debug, Clone)]
pub struct MonthlySummary {
    pub period: Period,
    pub income: Money,
    /// Spending as a positive magnitude
    pub expenses: Money,
    pub net: Money,
    pub savings_rate: Option<f64>,
    pub transaction_count: usize,
    pub uncategorized_count: usize,
    pub top_categories: Vec<Bucket>,
    currencies: CurrencyConfig,
}

impl MonthlySummary {
    pub fn generate(storage: &Storage, period: &Period, top_n: usize) -> DashboardResult<Self> {
        let ledger = PeriodLedger::load(storage, period)?;
        let income = ledger.total_income();
        let expenses = ledger.total_expenses();
        let spending = Aggregation::build(GroupKey::Category, ledger.expenses());

        Ok(Self {
            period: *period,
            income,
            expenses,
            net: income - expenses,
            savings_rate: savings_rate(income, expenses),
            transaction_count: ledger.rows.len(),
            uncategorized_count: ledger
                .rows
                .iter()
                .filter(|(t, _)| t.category.is_none())
                .count(),
            top_categories: spending.top_n(top_n).into_iter().cloned().collect(),
            currencies: ledger.currencies,
        })
    }

    pub fn format_terminal(&self) -> String {
        let money = |m: Money| self.currencies.format_default(m);
        let mut output = String::new();

        output.push_str(&format_header(&format!("Summary for {}", self.period), WIDTH));
        output.push('\n');
        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&format!("{:<24}{:>20}\n", "Income", money(self.income)));
        output.push_str(&format!("{:<24}{:>20}\n", "Expenses", money(-self.expenses)));
        output.push_str(&format!("{:<24}{:>20}\n", "Net", money(self.net)));
        output.push_str(&format!(
            "{:<24}{:>20}\n",
            "Savings rate",
            format_optional_percent(self.savings_rate)
        ));
        output.push_str(&format!(
            "{:<24}{:>20}\n",
            "Transactions", self.transaction_count
        ));
        if self.uncategorized_count > 0 {
            output.push_str(&format!(
                "{:<24}{:>20}\n",
                "Uncategorized", self.uncategorized_count
            ));
        }

        if !self.top_categories.is_empty() {
            output.push('\n');
            output.push_str("Top spending categories\n");
            output.push_str(&separator(WIDTH));
            output.push('\n');
            for bucket in &self.top_categories {
                output.push_str(&format!(
                    "{:<20}{:>16} {:>6.1}% {}\n",
                    bucket.key,
                    money(bucket.total),
                    bucket.percent_of_total,
                    format_bar(bucket.percent_of_total, 100.0, 14)
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use crate::models::Transaction;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn add(storage: &Storage, day: u32, cents: i64, category: Option<&str>) {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
            "entry",
            Money::from_cents(cents),
        );
        txn.category = category.map(String::from);
        storage.transactions.insert(txn).unwrap();
    }

    #[test]
    fn test_summary_figures() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 1, 2_000_000, Some("income/salary"));
        add(&storage, 3, -45_000, Some("motors/fuel"));
        add(&storage, 5, -100_000, Some("groceries"));
        add(&storage, 7, -5_000, None);
        add(&storage, 9, -1_000, Some("motors/maintenance"));

        let summary = MonthlySummary::generate(&storage, &Period::month(2024, 11), 2).unwrap();
        assert_eq!(summary.income, Money::from_units(20_000));
        assert_eq!(summary.expenses, Money::from_cents(151_000));
        assert_eq!(summary.net, Money::from_cents(1_849_000));
        assert_eq!(summary.uncategorized_count, 1);
        assert_eq!(summary.top_categories.len(), 2);
        assert_eq!(summary.top_categories[0].key, "groceries");
        assert_eq!(summary.top_categories[1].key, "motors");

        let text = summary.format_terminal();
        assert!(text.contains("2024-11"));
        assert!(text.contains("R20,000.00"));
        assert!(text.contains("-R1,510.00"));
    }

    #[test]
    fn test_empty_period_savings_rate_na() {
        let (_temp_dir, storage) = create_test_storage();
        let summary = MonthlySummary::generate(&storage, &Period::month(2030, 1), 5).unwrap();
        assert_eq!(summary.savings_rate, None);
        assert!(summary.format_terminal().contains("N/A"));
    }
}
