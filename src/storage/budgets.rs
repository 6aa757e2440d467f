//! Budget repository
//!
//! Persists budget targets in budgets.json.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::DashboardError;
use crate::models::{Budget, BudgetId, Period};

use super::file_io::{read_json_lenient, write_json_atomic};
use super::lock_poisoned;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct BudgetData {
    pub(crate) budgets: Vec<Budget>,
}

/// Repository for budget targets
pub struct BudgetRepository {
    path: PathBuf,
    budgets: RwLock<Vec<Budget>>,
}

impl BudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            budgets: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> Result<(), DashboardError> {
        let file_data: BudgetData = read_json_lenient(&self.path);
        *self.budgets.write().map_err(lock_poisoned)? = file_data.budgets;
        Ok(())
    }

    pub fn save(&self) -> Result<(), DashboardError> {
        let budgets = self.budgets.read().map_err(lock_poisoned)?;
        write_json_atomic(
            &self.path,
            &BudgetData {
                budgets: budgets.clone(),
            },
        )
    }

    /// All budgets ordered by period, entity and category
    pub fn get_all(&self) -> Result<Vec<Budget>, DashboardError> {
        let mut budgets = self.budgets.read().map_err(lock_poisoned)?.clone();
        budgets.sort_by(|a, b| {
            a.period
                .start_date()
                .cmp(&b.period.start_date())
                .then_with(|| a.entity.to_lowercase().cmp(&b.entity.to_lowercase()))
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(budgets)
    }

    /// Budgets for exactly this period
    pub fn get_for_period(&self, period: &Period) -> Result<Vec<Budget>, DashboardError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|b| &b.period == period)
            .collect())
    }

    pub fn get(&self, id: BudgetId) -> Result<Option<Budget>, DashboardError> {
        let budgets = self.budgets.read().map_err(lock_poisoned)?;
        Ok(budgets.iter().find(|b| b.id == id).cloned())
    }

    /// Find a budget by user input (short or full id)
    pub fn find(&self, input: &str) -> Result<Option<Budget>, DashboardError> {
        let budgets = self.budgets.read().map_err(lock_poisoned)?;
        Ok(budgets.iter().find(|b| b.id.matches(input)).cloned())
    }

    /// Insert or replace a budget by id
    pub fn upsert(&self, budget: Budget) -> Result<(), DashboardError> {
        let mut budgets = self.budgets.write().map_err(lock_poisoned)?;
        match budgets.iter_mut().find(|b| b.id == budget.id) {
            Some(slot) => *slot = budget,
            None => budgets.push(budget),
        }
        Ok(())
    }

    pub fn remove(&self, id: BudgetId) -> Result<Budget, DashboardError> {
        let mut budgets = self.budgets.write().map_err(lock_poisoned)?;
        let index = budgets
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| DashboardError::budget_not_found(id.to_string()))?;
        Ok(budgets.remove(index))
    }

    pub fn count(&self) -> Result<usize, DashboardError> {
        Ok(self.budgets.read().map_err(lock_poisoned)?.len())
    }
}
