//! Tax-year report
//!
//! Renders the per-entity tax estimate: gross income, capped deductions,
//! bracket liability, rebate and the resulting net liability.

use crate::config::settings::Settings;
use crate::display::report::{double_separator, format_header, separator};
use crate::error::DashboardResult;
use crate::models::{CurrencyConfig, Money, Period};
use crate::services::tax::{TaxService, TaxYearSummary, TaxpayerKind};
use crate::storage::Storage;

use super::format_optional_percent;

const WIDTH: usize = 64;

#[derive(Debug, Clone)]
pub struct TaxReport {
    pub summary: TaxYearSummary,
    currencies: CurrencyConfig,
}

impl TaxReport {
    /// Build the report for a tax year; entity kinds come from the settings
    pub fn generate(storage: &Storage, period: &Period, settings: &Settings) -> DashboardResult<Self> {
        let kinds = TaxpayerKind::map_entities(&settings.entities);
        let summary = TaxService::new(storage).summarize(period, &settings.tax, &kinds)?;
        Ok(Self {
            summary,
            currencies: storage.currencies.get()?,
        })
    }

    pub fn total_liability(&self) -> Money {
        self.summary
            .entities
            .iter()
            .map(|e| e.computation.net_liability)
            .sum()
    }

    pub fn format_terminal(&self) -> String {
        let money = |m: Money| self.currencies.format_default(m);
        let line = |label: &str, value: String| format!("  {:<30}{:>20}\n", label, value);
        let mut output = String::new();

        output.push_str(&format_header(
            &format!("Tax estimate, {}", self.summary.period),
            WIDTH,
        ));
        output.push('\n');
        output.push_str(&double_separator(WIDTH));
        output.push('\n');

        if self.summary.entities.is_empty() {
            output.push_str("No entity earned income in this tax year.\n");
            return output;
        }

        for entity in &self.summary.entities {
            let c = &entity.computation;
            output.push_str(&format!("{} ({})\n", entity.entity, entity.kind));
            output.push_str(&line("Gross income", money(c.gross_income)));
            for d in entity.deductions.iter().filter(|d| !d.spent.is_zero()) {
                output.push_str(&line(
                    &format!("Deduction: {}", d.category),
                    format!("{} of {}", money(d.allowed), money(d.spent)),
                ));
            }
            output.push_str(&line("Taxable income", money(c.taxable_income)));
            output.push_str(&line("Tax before rebate", money(c.bracket_liability)));
            if !c.rebate.is_zero() {
                output.push_str(&line("Rebate", money(-c.rebate)));
            }
            output.push_str(&line("Estimated tax", money(c.net_liability)));
            output.push_str(&line(
                "Effective rate",
                format_optional_percent(c.effective_rate().map(|r| r * 100.0)),
            ));
            output.push_str(&line(
                "Marginal rate",
                format!("{:.1}%", c.marginal_rate_bps as f64 / 100.0),
            ));
            output.push_str(&separator(WIDTH));
            output.push('\n');
        }

        output.push_str(&format!(
            "{:<32}{:>20}\n",
            "Total estimated tax",
            money(self.total_liability())
        ));
        output.push_str("Estimates only; not a substitute for a SARS assessment.\n");
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

    fn add(storage: &Storage, month: u32, cents: i64, category: &str, entity: &str) {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2024, month, 20).unwrap(),
            "entry",
            Money::from_cents(cents),
        );
        txn.apply_auto(Some(category.into()), Some(entity.into()));
        storage.transactions.insert(txn).unwrap();
    }

    #[test]
    fn test_business_entity_uses_small_business_table() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 5, 30_000_000, "income/salary", "Dad");
        add(&storage, 6, 40_000_000, "income/business", "Business");

        let report =
            TaxReport::generate(&storage, &Period::tax_year(2025), &Settings::default()).unwrap();
        assert_eq!(report.summary.entities.len(), 2);

        let business = report
            .summary
            .entities
            .iter()
            .find(|e| e.entity == "Business")
            .unwrap();
        assert_eq!(business.kind, TaxpayerKind::SmallBusiness);
        assert!(business.computation.rebate.is_zero());
        // (400,000 - 335,000) x 15%
        assert_eq!(business.computation.net_liability, Money::from_units(9_750));

        let dad = report
            .summary
            .entities
            .iter()
            .find(|e| e.entity == "Dad")
            .unwrap();
        assert_eq!(dad.kind, TaxpayerKind::Individual);

        let text = report.format_terminal();
        assert!(text.contains("Business (small business)"));
        assert!(text.contains("Total estimated tax"));
    }

    #[test]
    fn test_no_income_message() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 5, -10_000, "groceries", "Mom");
        let report =
            TaxReport::generate(&storage, &Period::tax_year(2025), &Settings::default()).unwrap();
        assert!(report.summary.entities.is_empty());
        assert!(report.total_liability().is_zero());
        assert!(report.format_terminal().contains("No entity earned income"));
    }
}
