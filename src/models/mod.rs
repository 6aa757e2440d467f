//! Core data models for the dashboard
//!
//! This module contains the data structures of the finance domain:
//! transactions, categorization rules, categories, entities, budgets,
//! periods and currencies.

pub mod budget;
pub mod category;
pub mod currency;
pub mod entity;
pub mod ids;
pub mod money;
pub mod period;
pub mod rule;
pub mod transaction;

pub use budget::{Budget, BudgetBasis};
pub use category::{category_matches, Category, Label};
pub use currency::{Currency, CurrencyConfig, BASE_CURRENCY};
pub use entity::{same_entity_name, Entity, EntityKind};
pub use ids::{BudgetId, RuleId, TransactionId};
pub use money::{Money, MoneyParseError};
pub use period::{Period, PeriodParseError};
pub use rule::CategoryRule;
pub use transaction::{CategorySource, Transaction, TransactionStatus};
