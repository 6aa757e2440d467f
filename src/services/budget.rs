//! Budget service
//!
//! Budget CRUD plus evaluation: actual spend for a budget's entity,
//! category and period compared against its target.

use std::fmt;

use tracing::info;

use crate::config::settings::BudgetSettings;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Budget, BudgetBasis, CurrencyConfig, Money, Period};
use crate::services::currency::amount_in_base;
use crate::storage::Storage;

/// Where a budget stands against its thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    NoTarget,
    OnTrack,
    Warning,
    Over,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTarget => write!(f, "no target"),
            Self::OnTrack => write!(f, "on track"),
            Self::Warning => write!(f, "warning"),
            Self::Over => write!(f, "over"),
        }
    }
}

/// A budget compared against actual spend
#[derive(Debug, Clone)]
pub struct BudgetEvaluation {
    pub budget: Budget,
    /// Actual spend in the base currency
    pub actual: Money,
    /// Target in the base currency
    pub target: Money,
    /// target - actual; negative when over budget
    pub variance: Money,
    /// actual / target as a percentage; `None` when the target is zero
    pub percent_used: Option<f64>,
    pub status: BudgetStatus,
}

impl BudgetEvaluation {
    /// Percentage for display, "N/A" without a target
    pub fn percent_display(&self) -> String {
        match self.percent_used {
            Some(p) => format!("{:.1}%", p),
            None => "N/A".to_string(),
        }
    }
}

/// Sum spend over matching transaction amounts (already in base currency)
///
/// Expenses-only counts the magnitude of negative amounts. Net negates the
/// signed sum so spending is positive and refunds reduce it.
pub fn compute_actual<I>(amounts: I, basis: BudgetBasis) -> Money
where
    I: IntoIterator<Item = Money>,
{
    match basis {
        BudgetBasis::ExpensesOnly => amounts
            .into_iter()
            .filter(Money::is_negative)
            .map(|m| m.abs())
            .sum(),
        BudgetBasis::Net => -amounts.into_iter().sum::<Money>(),
    }
}

/// Derive the status from actual and target
pub fn budget_status(
    actual: Money,
    target: Money,
    warning: f64,
    critical: f64,
) -> (Option<f64>, BudgetStatus) {
    match actual.ratio_of(target) {
        None => (None, BudgetStatus::NoTarget),
        Some(ratio) => {
            let status = if ratio > critical {
                BudgetStatus::Over
            } else if ratio >= warning {
                BudgetStatus::Warning
            } else {
                BudgetStatus::OnTrack
            };
            let percent = actual.cents() as f64 * 100.0 / target.cents() as f64;
            (Some(percent), status)
        }
    }
}

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a budget; one budget per entity, category and period
    pub fn create_budget(
        &self,
        entity: &str,
        category: Option<&str>,
        period: Period,
        target: Money,
    ) -> DashboardResult<Budget> {
        let mut budget = Budget::new(entity, category.map(str::to_string), period, target);
        budget.currency = self.storage.currencies.get()?.base;
        budget
            .validate()
            .map_err(|e| DashboardError::Validation(e.to_string()))?;

        if self
            .storage
            .budgets
            .get_all()?
            .iter()
            .any(|b| b.same_scope(&budget))
        {
            return Err(DashboardError::Duplicate {
                entity_type: "Budget",
                identifier: format!("{} {}", budget.period, budget.scope()),
            });
        }

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;
        info!(budget = %budget, "created budget");
        Ok(budget)
    }

    pub fn find_budget(&self, input: &str) -> DashboardResult<Budget> {
        self.storage
            .budgets
            .find(input)?
            .ok_or_else(|| DashboardError::budget_not_found(input.trim()))
    }

    pub fn set_target(&self, input: &str, target: Money) -> DashboardResult<Budget> {
        let mut budget = self.find_budget(input)?;
        budget.set_target(target);
        budget
            .validate()
            .map_err(|e| DashboardError::Validation(e.to_string()))?;
        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;
        Ok(budget)
    }

    pub fn delete_budget(&self, input: &str) -> DashboardResult<Budget> {
        let budget = self.find_budget(input)?;
        let removed = self.storage.budgets.remove(budget.id)?;
        self.storage.budgets.save()?;
        info!(budget = %removed, "deleted budget");
        Ok(removed)
    }

    /// Budgets, optionally limited to one period
    pub fn list_budgets(&self, period: Option<&Period>) -> DashboardResult<Vec<Budget>> {
        match period {
            Some(period) => self.storage.budgets.get_for_period(period),
            None => self.storage.budgets.get_all(),
        }
    }

    /// Actual spend for an entity, optional category and period
    pub fn actual_for(
        &self,
        entity: &str,
        category: Option<&str>,
        period: &Period,
        basis: BudgetBasis,
    ) -> DashboardResult<Money> {
        let probe = Budget::new(entity, category.map(str::to_string), *period, Money::zero());
        let config = self.storage.currencies.get()?;
        self.actual_for_budget(&probe, &config, basis)
    }

    fn actual_for_budget(
        &self,
        budget: &Budget,
        config: &CurrencyConfig,
        basis: BudgetBasis,
    ) -> DashboardResult<Money> {
        let transactions = self.storage.transactions.get_by_date_range(
            budget.period.start_date(),
            budget.period.end_date(),
        )?;
        let amounts = transactions
            .iter()
            .filter(|t| budget.covers(t))
            .map(|t| amount_in_base(config, t));
        Ok(compute_actual(amounts, basis))
    }

    /// Evaluate one budget
    pub fn evaluate(
        &self,
        budget: &Budget,
        settings: &BudgetSettings,
    ) -> DashboardResult<BudgetEvaluation> {
        let config = self.storage.currencies.get()?;
        self.evaluate_with(budget, settings, &config)
    }

    fn evaluate_with(
        &self,
        budget: &Budget,
        settings: &BudgetSettings,
        config: &CurrencyConfig,
    ) -> DashboardResult<BudgetEvaluation> {
        let actual = self.actual_for_budget(budget, config, settings.basis)?;
        let target = config
            .to_base(budget.target, &budget.currency)
            .unwrap_or(budget.target);
        let (percent_used, status) = budget_status(
            actual,
            target,
            settings.warning_threshold,
            settings.critical_threshold,
        );

        Ok(BudgetEvaluation {
            budget: budget.clone(),
            actual,
            target,
            variance: target - actual,
            percent_used,
            status,
        })
    }

    /// Evaluate every budget of a period
    pub fn evaluate_period(
        &self,
        period: &Period,
        settings: &BudgetSettings,
    ) -> DashboardResult<Vec<BudgetEvaluation>> {
        let config = self.storage.currencies.get()?;
        self.storage
            .budgets
            .get_for_period(period)?
            .iter()
            .map(|b| self.evaluate_with(b, settings, &config))
            .collect()
    }

    /// Copy a period's budgets into the following period
    ///
    /// Budgets that already exist in the target period are left alone.
    /// Returns the number of budgets created.
    pub fn roll_forward(&self, from: &Period) -> DashboardResult<usize> {
        let to = from.next();
        let existing = self.storage.budgets.get_for_period(&to)?;
        let mut created = 0;

        for source in self.storage.budgets.get_for_period(from)? {
            let mut copy = Budget::new(source.entity.clone(), source.category.clone(), to, source.target);
            copy.currency = source.currency.clone();
            if existing.iter().any(|b| b.same_scope(&copy)) {
                continue;
            }
            self.storage.budgets.upsert(copy)?;
            created += 1;
        }

        if created > 0 {
            self.storage.budgets.save()?;
        }
        info!(from = %from, to = %to, created, "rolled budgets forward");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use crate::models::{Transaction, TransactionStatus};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn add_txn(storage: &Storage, day: u32, cents: i64, category: &str, entity: &str) -> Transaction {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
            format!("txn {}", day),
            Money::from_cents(cents),
        );
        txn.apply_auto(Some(category.into()), Some(entity.into()));
        storage.transactions.insert(txn.clone()).unwrap();
        txn
    }

    #[test]
    fn test_compute_actual_bases() {
        let amounts = [Money::from_units(-100), Money::from_units(-50), Money::from_units(30)];
        assert_eq!(
            compute_actual(amounts, BudgetBasis::ExpensesOnly),
            Money::from_units(150)
        );
        assert_eq!(compute_actual(amounts, BudgetBasis::Net), Money::from_units(120));
        assert_eq!(
            compute_actual(Vec::new(), BudgetBasis::ExpensesOnly),
            Money::zero()
        );
    }

    #[test]
    fn test_status_thresholds() {
        let t = Money::from_units(100);
        assert_eq!(budget_status(Money::zero(), t, 0.8, 1.0), (Some(0.0), BudgetStatus::OnTrack));
        assert_eq!(budget_status(Money::from_units(80), t, 0.8, 1.0).1, BudgetStatus::Warning);
        assert_eq!(budget_status(Money::from_units(100), t, 0.8, 1.0).1, BudgetStatus::Warning);
        assert_eq!(budget_status(Money::from_units(101), t, 0.8, 1.0).1, BudgetStatus::Over);
        assert_eq!(
            budget_status(Money::from_units(50), Money::zero(), 0.8, 1.0),
            (None, BudgetStatus::NoTarget)
        );
    }

    #[test]
    fn test_evaluate_category_budget() {
        let (_temp_dir, storage) = create_test_storage();
        add_txn(&storage, 3, -45000, "motors/fuel", "Dad");
        add_txn(&storage, 10, -15000, "Motors/Maintenance", "dad");
        add_txn(&storage, 12, -9999, "groceries", "Dad");
        add_txn(&storage, 14, -20000, "motors/fuel", "Mom");

        let service = BudgetService::new(&storage);
        let budget = service
            .create_budget("Dad", Some("motors"), Period::month(2024, 11), Money::from_units(1000))
            .unwrap();

        let eval = service.evaluate(&budget, &BudgetSettings::default()).unwrap();
        assert_eq!(eval.actual, Money::from_units(600));
        assert_eq!(eval.variance, Money::from_units(400));
        assert_eq!(eval.percent_used, Some(60.0));
        assert_eq!(eval.status, BudgetStatus::OnTrack);
    }

    #[test]
    fn test_zero_target_and_empty_period() {
        let (_temp_dir, storage) = create_test_storage();
        add_txn(&storage, 3, -45000, "motors/fuel", "Dad");
        let service = BudgetService::new(&storage);
        let settings = BudgetSettings::default();

        let zero = service
            .create_budget("Dad", None, Period::month(2024, 11), Money::zero())
            .unwrap();
        let eval = service.evaluate(&zero, &settings).unwrap();
        assert_eq!(eval.percent_used, None);
        assert_eq!(eval.percent_display(), "N/A");
        assert_eq!(eval.status, BudgetStatus::NoTarget);

        let empty = service
            .create_budget("Dad", None, Period::month(2024, 12), Money::from_units(500))
            .unwrap();
        let eval = service.evaluate(&empty, &settings).unwrap();
        assert_eq!(eval.actual, Money::zero());
        assert_eq!(eval.percent_used, Some(0.0));
    }

    #[test]
    fn test_excluded_transactions_ignored() {
        let (_temp_dir, storage) = create_test_storage();
        let mut txn = add_txn(&storage, 3, -45000, "motors/fuel", "Dad");
        txn.set_status(TransactionStatus::Excluded);
        storage.transactions.update(txn).unwrap();

        let service = BudgetService::new(&storage);
        let actual = service
            .actual_for("Dad", None, &Period::month(2024, 11), BudgetBasis::ExpensesOnly)
            .unwrap();
        assert_eq!(actual, Money::zero());
    }

    #[test]
    fn test_duplicate_scope_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        service
            .create_budget("Mom", Some("groceries"), Period::month(2025, 1), Money::from_units(3000))
            .unwrap();
        assert!(service
            .create_budget("mom", Some("Groceries"), Period::month(2025, 1), Money::from_units(1))
            .is_err());
        assert!(service
            .create_budget("Mom", None, Period::month(2025, 1), Money::from_units(-1))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_roll_forward() {
        let (_temp_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let nov = Period::month(2024, 11);
        service
            .create_budget("Dad", Some("motors"), nov, Money::from_units(1000))
            .unwrap();
        service
            .create_budget("Mom", None, nov, Money::from_units(2000))
            .unwrap();
        service
            .create_budget("Mom", None, nov.next(), Money::from_units(2500))
            .unwrap();

        assert_eq!(service.roll_forward(&nov).unwrap(), 1);
        let dec = service.list_budgets(Some(&Period::month(2024, 12))).unwrap();
        assert_eq!(dec.len(), 2);
        assert!(dec.iter().any(|b| b.entity == "Mom" && b.target == Money::from_units(2500)));

        assert_eq!(service.roll_forward(&nov).unwrap(), 0);
    }

    #[test]
    fn test_update_and_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let budget = service
            .create_budget("Household", Some("home"), Period::month(2025, 2), Money::from_units(100))
            .unwrap();

        let updated = service
            .set_target(&budget.id.short(), Money::from_units(250))
            .unwrap();
        assert_eq!(updated.target, Money::from_units(250));

        service.delete_budget(&budget.id.short()).unwrap();
        assert!(service.list_budgets(None).unwrap().is_empty());
    }
}
