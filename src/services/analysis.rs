//! Financial analysis over several months
//!
//! Spending patterns, income against expenses, month-on-month category
//! growth, budget performance and an overall health score. Everything is
//! read-only and works on base-currency amounts.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::settings::BudgetSettings;
use crate::error::DashboardResult;
use crate::models::{Money, Period};
use crate::reports::{percent_of, savings_rate, Aggregation, GroupKey, PeriodLedger};
use crate::services::budget::{BudgetService, BudgetStatus};
use crate::storage::Storage;

/// Income and spending of one month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthFlow {
    pub period: Period,
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
    pub savings_rate: Option<f64>,
}

/// Spending in one category across a window of months
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingPattern {
    pub category: String,
    pub total: Money,
    pub monthly_average: Money,
    /// Months in the window with any spend in this category
    pub active_months: usize,
    /// Share of all spending in the window, as a percentage
    pub share: f64,
}

/// A category compared with the previous period
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTrend {
    pub category: String,
    pub current: Money,
    pub previous: Money,
    pub change: Money,
    /// `None` when the category had no spend in the previous period
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPerformance {
    pub period: Period,
    pub budgets: usize,
    pub on_track: usize,
    pub warning: usize,
    pub over: usize,
    pub no_target: usize,
    pub total_target: Money,
    pub total_actual: Money,
    pub utilization: Option<f64>,
}

impl BudgetPerformance {
    /// Share of budgets with a target that are not over, as a percentage
    pub fn adherence(&self) -> Option<f64> {
        let scored = self.budgets - self.no_target;
        if scored == 0 {
            None
        } else {
            Some((scored - self.over) as f64 * 100.0 / scored as f64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthGrade {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

impl HealthGrade {
    fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::NeedsAttention,
        }
    }
}

impl std::fmt::Display for HealthGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Fair => write!(f, "fair"),
            Self::NeedsAttention => write!(f, "needs attention"),
        }
    }
}

/// Indicators and a 0-100 score for a window of months
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialHealth {
    pub months: Vec<MonthFlow>,
    pub savings_rate: Option<f64>,
    /// Expenses as a percentage of income
    pub expense_ratio: Option<f64>,
    /// Percentage of months that ended with a positive net
    pub positive_months: f64,
    /// Percentage of transactions with a category
    pub categorized_share: Option<f64>,
    pub budget_adherence: Option<f64>,
    pub score: u8,
    pub grade: HealthGrade,
}

/// The `count` months ending at `end`, oldest first
pub fn month_window(end: &Period, count: usize) -> Vec<Period> {
    let mut current = match end {
        Period::Month { .. } => *end,
        other => Period::month_of(other.end_date()),
    };
    let mut months = Vec::with_capacity(count);
    for _ in 0..count {
        months.push(current);
        current = current.prev();
    }
    months.reverse();
    months
}

pub struct AnalysisService<'a> {
    storage: &'a Storage,
}

impl<'a> AnalysisService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Income, expenses and savings rate for each of `months` months ending at `end`
    pub fn income_vs_expenses(&self, end: &Period, months: usize) -> DashboardResult<Vec<MonthFlow>> {
        month_window(end, months)
            .into_iter()
            .map(|period| {
                let ledger = PeriodLedger::load(self.storage, &period)?;
                let income = ledger.total_income();
                let expenses = ledger.total_expenses();
                Ok(MonthFlow {
                    period,
                    income,
                    expenses,
                    net: income - expenses,
                    savings_rate: savings_rate(income, expenses),
                })
            })
            .collect()
    }

    /// Per-category spending over `months` months ending at `end`, largest first
    pub fn spending_patterns(&self, end: &Period, months: usize) -> DashboardResult<Vec<SpendingPattern>> {
        let window = month_window(end, months);
        let mut totals: BTreeMap<String, (Money, usize)> = BTreeMap::new();

        for period in &window {
            let ledger = PeriodLedger::load(self.storage, period)?;
            for bucket in Aggregation::build(GroupKey::Category, ledger.expenses()).buckets {
                let entry = totals.entry(bucket.key).or_insert((Money::zero(), 0));
                entry.0 += bucket.total;
                entry.1 += 1;
            }
        }

        let grand_total: Money = totals.values().map(|(t, _)| *t).sum();
        let divisor = window.len().max(1) as i64;
        let mut patterns: Vec<SpendingPattern> = totals
            .into_iter()
            .map(|(category, (total, active_months))| SpendingPattern {
                monthly_average: Money::from_cents(total.cents() / divisor),
                share: percent_of(total, grand_total),
                category,
                total,
                active_months,
            })
            .collect();
        patterns.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(patterns)
    }

    /// Category spend in `period` against the period before it
    pub fn category_growth(&self, period: &Period) -> DashboardResult<Vec<CategoryTrend>> {
        let current_ledger = PeriodLedger::load(self.storage, period)?;
        let previous_ledger = PeriodLedger::load(self.storage, &period.prev())?;
        let current = Aggregation::build(GroupKey::Category, current_ledger.expenses());
        let previous = Aggregation::build(GroupKey::Category, previous_ledger.expenses());

        let mut keys: Vec<&String> = current
            .buckets
            .iter()
            .chain(previous.buckets.iter())
            .map(|b| &b.key)
            .collect();
        keys.sort();
        keys.dedup();

        let mut trends: Vec<CategoryTrend> = keys
            .into_iter()
            .map(|key| {
                let now = current.get(key).map(|b| b.total).unwrap_or_default();
                let before = previous.get(key).map(|b| b.total).unwrap_or_default();
                let change = now - before;
                CategoryTrend {
                    category: key.clone(),
                    current: now,
                    previous: before,
                    change,
                    change_percent: change.ratio_of(before).map(|r| r * 100.0),
                }
            })
            .collect();
        trends.sort_by(|a, b| b.change.abs().cmp(&a.change.abs()));
        Ok(trends)
    }

    pub fn budget_performance(
        &self,
        period: &Period,
        settings: &BudgetSettings,
    ) -> DashboardResult<BudgetPerformance> {
        let evaluations = BudgetService::new(self.storage).evaluate_period(period, settings)?;
        let count = |status: BudgetStatus| evaluations.iter().filter(|e| e.status == status).count();
        let total_target: Money = evaluations.iter().map(|e| e.target).sum();
        let total_actual: Money = evaluations.iter().map(|e| e.actual).sum();

        Ok(BudgetPerformance {
            period: *period,
            budgets: evaluations.len(),
            on_track: count(BudgetStatus::OnTrack),
            warning: count(BudgetStatus::Warning),
            over: count(BudgetStatus::Over),
            no_target: count(BudgetStatus::NoTarget),
            utilization: total_actual.ratio_of(total_target).map(|r| r * 100.0),
            total_target,
            total_actual,
        })
    }

    /// Score the `months` months ending at `end`
    ///
    /// Weights: savings rate 40 (full marks at 20% or more), budget
    /// adherence 30, categorized share 20, positive months 10. Without
    /// budgets the adherence part scores half.
    pub fn financial_health(
        &self,
        end: &Period,
        months: usize,
        settings: &BudgetSettings,
    ) -> DashboardResult<FinancialHealth> {
        let flows = self.income_vs_expenses(end, months)?;
        let income: Money = flows.iter().map(|f| f.income).sum();
        let expenses: Money = flows.iter().map(|f| f.expenses).sum();
        let rate = savings_rate(income, expenses);
        let expense_ratio = expenses.ratio_of(income).map(|r| r * 100.0);
        let positive = flows.iter().filter(|f| f.net.is_positive()).count();
        let positive_months = if flows.is_empty() {
            0.0
        } else {
            positive as f64 * 100.0 / flows.len() as f64
        };

        let (mut categorized, mut total) = (0usize, 0usize);
        let mut adherence_parts = Vec::new();
        for flow in &flows {
            let ledger = PeriodLedger::load(self.storage, &flow.period)?;
            total += ledger.rows.len();
            categorized += ledger.rows.iter().filter(|(t, _)| t.category.is_some()).count();
            if let Some(a) = self.budget_performance(&flow.period, settings)?.adherence() {
                adherence_parts.push(a);
            }
        }
        let categorized_share = if total == 0 {
            None
        } else {
            Some(categorized as f64 * 100.0 / total as f64)
        };
        let budget_adherence = if adherence_parts.is_empty() {
            None
        } else {
            Some(adherence_parts.iter().sum::<f64>() / adherence_parts.len() as f64)
        };

        let savings_points = rate.map(|r| (r / 20.0).clamp(0.0, 1.0) * 40.0).unwrap_or(0.0);
        let budget_points = budget_adherence.map(|a| a / 100.0 * 30.0).unwrap_or(15.0);
        let category_points = categorized_share.map(|c| c / 100.0 * 20.0).unwrap_or(0.0);
        let month_points = positive_months / 100.0 * 10.0;
        let score = (savings_points + budget_points + category_points + month_points)
            .round()
            .clamp(0.0, 100.0) as u8;

        debug!(score, months = flows.len(), "computed financial health");
        Ok(FinancialHealth {
            months: flows,
            savings_rate: rate,
            expense_ratio,
            positive_months,
            categorized_share,
            budget_adherence,
            score,
            grade: HealthGrade::from_score(score),
        })
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

    fn add(storage: &Storage, month: u32, cents: i64, category: Option<&str>) {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, month, 10).unwrap(),
            "entry",
            Money::from_cents(cents),
        );
        txn.apply_auto(category.map(String::from), Some("Dad".into()));
        storage.transactions.insert(txn).unwrap();
    }

    #[test]
    fn test_month_window_crosses_year() {
        let window = month_window(&Period::month(2025, 2), 3);
        assert_eq!(
            window,
            vec![Period::month(2024, 12), Period::month(2025, 1), Period::month(2025, 2)]
        );
        assert_eq!(month_window(&Period::tax_year(2025), 1), vec![Period::month(2025, 2)]);
    }

    #[test]
    fn test_income_vs_expenses() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 1, 1_000_000, Some("income/salary"));
        add(&storage, 1, -250_000, Some("home/rent"));
        add(&storage, 2, -50_000, Some("groceries"));

        let flows = AnalysisService::new(&storage)
            .income_vs_expenses(&Period::month(2025, 2), 2)
            .unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].savings_rate, Some(75.0));
        assert_eq!(flows[1].net, Money::from_units(-500));
        assert_eq!(flows[1].savings_rate, None);
    }

    #[test]
    fn test_spending_patterns_average() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 1, -30_000, Some("motors/fuel"));
        add(&storage, 3, -60_000, Some("motors/fuel"));
        add(&storage, 3, -10_000, Some("groceries"));

        let patterns = AnalysisService::new(&storage)
            .spending_patterns(&Period::month(2025, 3), 3)
            .unwrap();
        assert_eq!(patterns[0].category, "motors");
        assert_eq!(patterns[0].total, Money::from_units(900));
        assert_eq!(patterns[0].monthly_average, Money::from_units(300));
        assert_eq!(patterns[0].active_months, 2);
        assert_eq!(patterns[0].share, 90.0);
    }

    #[test]
    fn test_category_growth() {
        let (_temp_dir, storage) = create_test_storage();
        add(&storage, 4, -10_000, Some("groceries"));
        add(&storage, 5, -15_000, Some("groceries"));
        add(&storage, 5, -2_000, Some("health"));

        let trends = AnalysisService::new(&storage)
            .category_growth(&Period::month(2025, 5))
            .unwrap();
        let groceries = trends.iter().find(|t| t.category == "groceries").unwrap();
        assert_eq!(groceries.change, Money::from_units(50));
        assert_eq!(groceries.change_percent, Some(50.0));
        let health = trends.iter().find(|t| t.category == "health").unwrap();
        assert_eq!(health.change_percent, None);
    }

    #[test]
    fn test_budget_performance_and_health() {
        let (_temp_dir, storage) = create_test_storage();
        let period = Period::month(2025, 6);
        let budgets = BudgetService::new(&storage);
        budgets
            .create_budget("Dad", Some("groceries"), period, Money::from_units(1_000))
            .unwrap();
        budgets
            .create_budget("Dad", Some("motors"), period, Money::from_units(100))
            .unwrap();
        add(&storage, 6, 2_000_000, Some("income/salary"));
        add(&storage, 6, -50_000, Some("groceries"));
        add(&storage, 6, -20_000, Some("motors/fuel"));

        let service = AnalysisService::new(&storage);
        let settings = BudgetSettings::default();
        let perf = service.budget_performance(&period, &settings).unwrap();
        assert_eq!((perf.budgets, perf.on_track, perf.over), (2, 1, 1));
        assert_eq!(perf.adherence(), Some(50.0));

        let health = service.financial_health(&period, 1, &settings).unwrap();
        // savings 96.5% -> 40, adherence 50% -> 15, all categorized -> 20, positive -> 10
        assert_eq!(health.score, 85);
        assert_eq!(health.grade, HealthGrade::Excellent);
    }
}
