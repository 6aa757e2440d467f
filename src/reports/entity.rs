//! Per-entity report
//!
//! Income, spending and net result for each entity, plus the category
//! each entity spends the most on.

use std::collections::BTreeMap;

use crate::display::report::{format_header, format_percentage, separator};
use crate::error::DashboardResult;
use crate::models::{same_entity_name, CurrencyConfig, Money, Period, Transaction};
use crate::storage::Storage;

use super::aggregate::{percent_of, Aggregation, GroupKey};
use super::PeriodLedger;

const WIDTH: usize = 86;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub entity: String,
    pub income: Money,
    /// Spending as a positive magnitude
    pub expenses: Money,
    pub net: Money,
    /// This entity's share of all spending, as a percentage
    pub share_of_expenses: f64,
    pub top_category: Option<String>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone)]
pub struct EntityReport {
    pub period: Period,
    pub rows: Vec<EntityRow>,
    pub total_income: Money,
    pub total_expenses: Money,
    currencies: CurrencyConfig,
}

impl EntityReport {
    pub fn generate(storage: &Storage, period: &Period) -> DashboardResult<Self> {
        let ledger = PeriodLedger::load(storage, period)?;
        let income = Aggregation::build(GroupKey::Entity, ledger.income());
        let expenses = Aggregation::build(GroupKey::Entity, ledger.expenses());

        // entity -> its expense rows, for the top category column
        let mut spend_by_category: BTreeMap<String, Vec<(&Transaction, Money)>> = BTreeMap::new();
        for (txn, amount) in ledger.expenses() {
            spend_by_category
                .entry(GroupKey::Entity.key_for(txn))
                .or_default()
                .push((txn, amount));
        }

        let mut names: Vec<String> = income
            .buckets
            .iter()
            .chain(expenses.buckets.iter())
            .map(|b| b.key.clone())
            .collect();
        names.sort();
        names.dedup();

        let rows = names
            .into_iter()
            .map(|entity| {
                let inc = income.get(&entity).map(|b| b.total).unwrap_or_default();
                let exp_bucket = expenses.get(&entity);
                let exp = exp_bucket.map(|b| b.total).unwrap_or_default();
                let count = income.get(&entity).map(|b| b.count).unwrap_or(0)
                    + exp_bucket.map(|b| b.count).unwrap_or(0);
                let top_category = spend_by_category.get(&entity).and_then(|items| {
                    Aggregation::build(GroupKey::Category, items.iter().copied())
                        .top_n(1)
                        .first()
                        .map(|b| b.key.clone())
                });
                EntityRow {
                    share_of_expenses: percent_of(exp, expenses.grand_total),
                    net: inc - exp,
                    income: inc,
                    expenses: exp,
                    top_category,
                    transaction_count: count,
                    entity,
                }
            })
            .collect();

        Ok(Self {
            period: *period,
            rows,
            total_income: income.grand_total,
            total_expenses: expenses.grand_total,
            currencies: ledger.currencies,
        })
    }

    pub fn row(&self, entity: &str) -> Option<&EntityRow> {
        self.rows.iter().find(|r| same_entity_name(&r.entity, entity))
    }

    pub fn format_terminal(&self) -> String {
        let money = |m: Money| self.currencies.format_default(m);
        let mut output = String::new();

        output.push_str(&format_header(&format!("Entities, {}", self.period), WIDTH));
        output.push('\n');
        output.push_str(&separator(WIDTH));
        output.push('\n');

        if self.rows.is_empty() {
            output.push_str("No transactions in this period.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<14}{:>16}{:>16}{:>16}{:>8}  {}\n",
            "Entity", "Income", "Expenses", "Net", "Share", "Top category"
        ));
        for row in &self.rows {
            output.push_str(&format!(
                "{:<14}{:>16}{:>16}{:>16}{:>8}  {}\n",
                row.entity,
                money(row.income),
                money(row.expenses),
                money(row.net),
                format_percentage(row.share_of_expenses),
                row.top_category.as_deref().unwrap_or("-")
            ));
        }
        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{:<14}{:>16}{:>16}{:>16}\n",
            "Total",
            money(self.total_income),
            money(self.total_expenses),
            money(self.total_income - self.total_expenses)
        ));
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

    fn add(storage: &Storage, cents: i64, category: &str, entity: Option<&str>) {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            "entry",
            Money::from_cents(cents),
        );
        txn.apply_auto(Some(category.into()), entity.map(String::from));
        storage.transactions.insert(txn).unwrap();
    }

    #[test]
    fn test_entity_rows() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 3_000_000, "income/salary", Some("Dad"));
        add(&storage, -200_000, "motors/fuel", Some("Dad"));
        add(&storage, -50_000, "groceries", Some("Dad"));
        add(&storage, -250_000, "home/rent", Some("Household"));
        add(&storage, -1_000, "other", None);

        let report = EntityReport::generate(&storage, &Period::month(2025, 3)).unwrap();
        assert_eq!(report.rows.len(), 3);

        let dad = report.row("dad").unwrap();
        assert_eq!(dad.income, Money::from_units(30_000));
        assert_eq!(dad.expenses, Money::from_units(2_500));
        assert_eq!(dad.net, Money::from_units(27_500));
        assert_eq!(dad.top_category.as_deref(), Some("motors"));
        assert_eq!(dad.transaction_count, 3);

        let household = report.row("Household").unwrap();
        assert!(household.income.is_zero());
        assert_eq!(household.net, Money::from_units(-2_500));

        assert!(report.row("Unassigned").is_some());
        let shares: f64 = report.rows.iter().map(|r| r.share_of_expenses).sum();
        assert!((shares - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report() {
        let (_temp_dir, storage) = create_test_storage();
        let report = EntityReport::generate(&storage, &Period::month(2025, 3)).unwrap();
        assert!(report.rows.is_empty());
        assert!(report.format_terminal().contains("No transactions"));
    }
}
