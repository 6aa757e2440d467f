//! Category breakdown report
//!
//! Spending per top-level category with each category's labels nested
//! underneath. Can be exported as CSV.

use std::io::Write;

use crate::display::report::{format_bar, format_header, format_percentage, separator};
use crate::error::{DashboardError, DashboardResult};
use crate::models::{CurrencyConfig, Money, Period};
use crate::storage::Storage;

use super::aggregate::{Aggregation, Bucket, GroupKey, UNCATEGORIZED};
use super::PeriodLedger;

const WIDTH: usize = 72;

#[derive(Debug, Clone)]
pub struct CategoryBreakdown {
    pub period: Period,
    /// Expense magnitudes per top-level category
    pub categories: Aggregation,
    /// Expense magnitudes per full category path
    pub labels: Aggregation,
    currencies: CurrencyConfig,
}

impl CategoryBreakdown {
    pub fn generate(storage: &Storage, period: &Period) -> DashboardResult<Self> {
        let ledger = PeriodLedger::load(storage, period)?;
        Ok(Self {
            period: *period,
            categories: Aggregation::build(GroupKey::Category, ledger.expenses()),
            labels: Aggregation::build(GroupKey::Label, ledger.expenses()),
            currencies: ledger.currencies,
        })
    }

    pub fn total(&self) -> Money {
        self.categories.grand_total
    }

    /// Label buckets under a top-level category, largest first
    pub fn labels_of(&self, category: &str) -> Vec<&Bucket> {
        let prefix = format!("{}/", category);
        let mut labels: Vec<&Bucket> = self
            .labels
            .buckets
            .iter()
            .filter(|b| b.key.starts_with(&prefix))
            .collect();
        labels.sort_by(|a, b| b.total.cmp(&a.total));
        labels
    }

    pub fn format_terminal(&self) -> String {
        let money = |m: Money| self.currencies.format_default(m);
        let mut output = String::new();

        output.push_str(&format_header(
            &format!("Spending by category, {}", self.period),
            WIDTH,
        ));
        output.push('\n');
        output.push_str(&separator(WIDTH));
        output.push('\n');

        if self.categories.is_empty() {
            output.push_str("No spending in this period.\n");
            return output;
        }

        let mut ranked: Vec<&Bucket> = self.categories.buckets.iter().collect();
        ranked.sort_by(|a, b| b.total.cmp(&a.total));

        for bucket in ranked {
            output.push_str(&format!(
                "{:<26}{:>16} {:>6} {}\n",
                bucket.key,
                money(bucket.total),
                format_percentage(bucket.percent_of_total),
                format_bar(bucket.percent_of_total, 100.0, 16)
            ));
            if bucket.key == UNCATEGORIZED {
                continue;
            }
            for label in self.labels_of(&bucket.key) {
                let name = label.key.split_once('/').map(|(_, l)| l).unwrap_or(&label.key);
                output.push_str(&format!(
                    "  {:<24}{:>16} {:>6}\n",
                    name,
                    money(label.total),
                    format_percentage(label.percent_of_total)
                ));
            }
        }

        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{:<26}{:>16}  ({} transactions)\n",
            "Total",
            money(self.total()),
            self.categories.count
        ));
        output
    }

    /// Write one row per category path: category, label, total, count, percent
    pub fn export_csv<W: Write>(&self, writer: W) -> DashboardResult<()> {
        let export_err = |e: csv::Error| DashboardError::Export(e.to_string());
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(["category", "label", "total", "count", "percent_of_total"])
            .map_err(export_err)?;

        for bucket in &self.labels.buckets {
            let (category, label) = match bucket.key.split_once('/') {
                Some((c, l)) => (c, l),
                None => (bucket.key.as_str(), ""),
            };
            csv_writer.write_record([
                category.to_string(),
                label.to_string(),
                bucket.total.to_plain_string(),
                bucket.count.to_string(),
                format!("{:.2}", bucket.percent_of_total),
            ])
            .map_err(export_err)?;
        }

        csv_writer
            .flush()
            .map_err(|e| DashboardError::Export(e.to_string()))
    }
}
