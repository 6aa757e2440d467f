//! Budget vs actual report

use crate::config::settings::BudgetSettings;
use crate::display::report::{format_bar, format_header, separator, truncate};
use crate::error::DashboardResult;
use crate::models::{CurrencyConfig, Money, Period};
use crate::services::budget::{BudgetEvaluation, BudgetService, BudgetStatus};
use crate::storage::Storage;

use super::format_optional_percent;

const WIDTH: usize = 92;

#[derive(Debug, Clone)]
pub struct BudgetReport {
    pub period: Period,
    pub evaluations: Vec<BudgetEvaluation>,
    pub total_target: Money,
    pub total_actual: Money,
    currencies: CurrencyConfig,
}

impl BudgetReport {
    pub fn generate(
        storage: &Storage,
        period: &Period,
        settings: &BudgetSettings,
    ) -> DashboardResult<Self> {
        let evaluations = BudgetService::new(storage).evaluate_period(period, settings)?;
        let total_target = evaluations.iter().map(|e| e.target).sum();
        let total_actual = evaluations.iter().map(|e| e.actual).sum();

        Ok(Self {
            period: *period,
            evaluations,
            total_target,
            total_actual,
            currencies: storage.currencies.get()?,
        })
    }

    pub fn total_variance(&self) -> Money {
        self.total_target - self.total_actual
    }

    /// actual / target over all budgets; `None` when no target is set
    pub fn percent_used(&self) -> Option<f64> {
        if self.total_target.is_zero() {
            return None;
        }
        Some(self.total_actual.cents() as f64 * 100.0 / self.total_target.cents() as f64)
    }

    pub fn count_with_status(&self, status: BudgetStatus) -> usize {
        self.evaluations.iter().filter(|e| e.status == status).count()
    }

    pub fn format_terminal(&self) -> String {
        let money = |m: Money| self.currencies.format_default(m);
        let mut output = String::new();

        output.push_str(&format_header(&format!("Budgets, {}", self.period), WIDTH));
        output.push('\n');
        output.push_str(&separator(WIDTH));
        output.push('\n');

        if self.evaluations.is_empty() {
            output.push_str("No budgets for this period.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<28}{:>15}{:>15}{:>15}{:>8}  {}\n",
            "Budget", "Target", "Actual", "Variance", "Used", "Status"
        ));
        for eval in &self.evaluations {
            let marker = match eval.status {
                BudgetStatus::Over => "!!",
                BudgetStatus::Warning => "! ",
                _ => "  ",
            };
            output.push_str(&format!(
                "{:<28}{:>15}{:>15}{:>15}{:>8}  {}{}\n",
                truncate(&eval.budget.scope(), 27),
                money(eval.target),
                money(eval.actual),
                money(eval.variance),
                eval.percent_display(),
                marker,
                eval.status
            ));
            if let Some(p) = eval.percent_used {
                output.push_str(&format!("{:<28}{}\n", "", format_bar(p, 100.0, 30)));
            }
        }

        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{:<28}{:>15}{:>15}{:>15}{:>8}\n",
            "Total",
            money(self.total_target),
            money(self.total_actual),
            money(self.total_variance()),
            format_optional_percent(self.percent_used())
        ));

        let over = self.count_with_status(BudgetStatus::Over);
        let warning = self.count_with_status(BudgetStatus::Warning);
        if over + warning > 0 {
            output.push_str(&format!("{} over budget, {} near the limit\n", over, warning));
        }
        output
    }
}
