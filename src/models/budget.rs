//! Budget model
//!
//! A budget sets a spending target for one entity, optionally narrowed to a
//! category, over one period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::category_matches;
use super::entity::same_entity_name;
use super::ids::BudgetId;
use super::money::Money;
use super::period::Period;
use super::transaction::Transaction;

/// How actual spend is computed from matching transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetBasis {
    /// Sum of expense magnitudes; income is ignored
    #[default]
    ExpensesOnly,
    /// Expenses minus income (refunds reduce spend)
    Net,
}

impl fmt::Display for BudgetBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpensesOnly => write!(f, "expenses only"),
            Self::Net => write!(f, "net"),
        }
    }
}

/// A spending target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    /// Entity the budget applies to
    pub entity: String,

    /// Category filter; `None` covers every category
    #[serde(default)]
    pub category: Option<String>,

    pub period: Period,

    /// Target spend, a non-negative amount
    pub target: Money,

    #[serde(default = "default_currency")]
    pub currency: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "ZAR".to_string()
}

impl Budget {
    pub fn new(
        entity: impl Into<String>,
        category: Option<String>,
        period: Period,
        target: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            entity: entity.into().trim().to_string(),
            category: category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            period,
            target,
            currency: default_currency(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the target amount
    pub fn set_target(&mut self, target: Money) {
        self.target = target;
        self.updated_at = Utc::now();
    }

    /// Whether a transaction counts toward this budget
    ///
    /// Period, entity and category must all match; excluded transactions
    /// never count.
    pub fn covers(&self, txn: &Transaction) -> bool {
        if !txn.is_active() || !self.period.contains(txn.date) {
            return false;
        }
        let entity_matches = txn
            .entity
            .as_deref()
            .is_some_and(|e| same_entity_name(e, &self.entity));
        if !entity_matches {
            return false;
        }
        match (&self.category, &txn.category) {
            (None, _) => true,
            (Some(filter), Some(category)) => category_matches(filter, category),
            (Some(_), None) => false,
        }
    }

    /// Same entity, category and period, ignoring the target
    pub fn same_scope(&self, other: &Budget) -> bool {
        self.period == other.period
            && same_entity_name(&self.entity, &other.entity)
            && match (&self.category, &other.category) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
    }

    /// Human-readable scope, e.g. "Dad / motors"
    pub fn scope(&self) -> String {
        format!(
            "{} / {}",
            self.entity,
            self.category.as_deref().unwrap_or("all categories")
        )
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.entity.is_empty() {
            return Err(BudgetValidationError::MissingEntity);
        }
        if self.target.is_negative() {
            return Err(BudgetValidationError::NegativeTarget);
        }
        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: target {}", self.period, self.scope(), self.target)
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    MissingEntity,
    NegativeTarget,
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntity => write!(f, "Budget must name an entity"),
            Self::NegativeTarget => write!(f, "Budget target cannot be negative"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
