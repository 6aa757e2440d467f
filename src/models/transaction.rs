//! Transaction model
//!
//! Transactions are imported from bank statements and never physically
//! deleted. Only the category and entity fields change after import, and a
//! transaction can be excluded from aggregation through its soft status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::TransactionId;
use super::money::Money;

/// Soft lifecycle state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Counted in every report and budget
    #[default]
    Active,
    /// Kept on disk but ignored by aggregation
    Excluded,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Excluded => write!(f, "Excluded"),
        }
    }
}

/// Where the current category/entity assignment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// No rule matched and nobody assigned one
    #[default]
    Uncategorized,
    /// Assigned by a categorization rule
    Auto,
    /// Assigned by hand; automatic passes leave it alone
    Manual,
}

impl fmt::Display for CategorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncategorized => write!(f, "none"),
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Transaction date
    pub date: NaiveDate,

    /// Raw statement description (trimmed)
    pub description: String,

    /// Amount (positive for income, negative for expense)
    pub amount: Money,

    /// ISO currency code of `amount`
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Category path such as "groceries" or "motors/fuel"
    #[serde(default)]
    pub category: Option<String>,

    /// Entity the transaction is attributed to
    #[serde(default)]
    pub entity: Option<String>,

    /// File the transaction was imported from
    #[serde(default)]
    pub source_file: String,

    /// Deterministic fingerprint for duplicate detection during import
    #[serde(default)]
    pub import_id: Option<String>,

    #[serde(default)]
    pub category_source: CategorySource,

    #[serde(default)]
    pub status: TransactionStatus,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "ZAR".to_string()
}

impl Transaction {
    /// Create a new, uncategorized transaction
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            date,
            description: description.into().trim().to_string(),
            amount,
            currency: default_currency(),
            category: None,
            entity: None,
            source_file: String::new(),
            import_id: None,
            category_source: CategorySource::Uncategorized,
            status: TransactionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount.is_positive()
    }

    /// Check if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }

    /// Whether aggregation should count this transaction
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Whether the category was set by hand
    pub fn is_manual(&self) -> bool {
        self.category_source == CategorySource::Manual
    }

    /// The top-level category, i.e. the part before any `/`
    pub fn top_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(|c| c.split('/').next().unwrap_or(c))
    }

    /// Apply an automatic categorization result
    ///
    /// Returns `true` when the assignment changed.
    pub fn apply_auto(&mut self, category: Option<String>, entity: Option<String>) -> bool {
        let source = if category.is_some() {
            CategorySource::Auto
        } else {
            CategorySource::Uncategorized
        };
        if self.category == category && self.entity == entity && self.category_source == source {
            return false;
        }
        self.category = category;
        self.entity = entity;
        self.category_source = source;
        self.updated_at = Utc::now();
        true
    }

    /// Record a manual category/entity override
    pub fn apply_manual(&mut self, category: Option<String>, entity: Option<String>) {
        self.category = category;
        self.entity = entity;
        self.category_source = CategorySource::Manual;
        self.updated_at = Utc::now();
    }

    /// Set the soft status
    pub fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.description.is_empty() {
            return Err(TransactionValidationError::EmptyDescription);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(TransactionValidationError::InvalidCurrency(
                self.currency.clone(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.date,
            self.description,
            self.amount,
            self.category.as_deref().unwrap_or("uncategorized")
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    EmptyDescription,
    InvalidCurrency(String),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "Transaction description cannot be empty"),
            Self::InvalidCurrency(c) => write!(f, "Invalid currency code: '{}'", c),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(),
            "  SASOL FUEL STATION ",
            Money::from_cents(-45000),
        )
    }

    #[test]
    fn test_new_transaction() {
        let txn = sample();
        assert_eq!(txn.description, "SASOL FUEL STATION");
        assert!(txn.is_expense());
        assert!(!txn.is_income());
        assert!(txn.is_active());
        assert_eq!(txn.currency, "ZAR");
        assert_eq!(txn.category_source, CategorySource::Uncategorized);
    }

    #[test]
    fn test_apply_auto_reports_changes() {
        let mut txn = sample();
        assert!(txn.apply_auto(Some("motors/fuel".into()), Some("Dad".into())));
        assert_eq!(txn.category_source, CategorySource::Auto);
        assert_eq!(txn.top_category(), Some("motors"));
        assert!(!txn.apply_auto(Some("motors/fuel".into()), Some("Dad".into())));

        assert!(txn.apply_auto(None, None));
        assert_eq!(txn.category_source, CategorySource::Uncategorized);
    }

    #[test]
    fn test_apply_manual() {
        let mut txn = sample();
        txn.apply_manual(Some("business".into()), None);
        assert!(txn.is_manual());
        assert_eq!(txn.category.as_deref(), Some("business"));
    }

    #[test]
    fn test_validation() {
        let mut txn = sample();
        assert!(txn.validate().is_ok());

        txn.currency = "zar".into();
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::InvalidCurrency(_))
        ));

        let mut empty = sample();
        empty.description.clear();
        assert_eq!(
            empty.validate(),
            Err(TransactionValidationError::EmptyDescription)
        );
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut txn = sample();
        txn.apply_auto(Some("motors/fuel".into()), Some("Dad".into()));
        let json = serde_json::to_string(&txn).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(txn, back);
    }
}
