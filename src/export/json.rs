//! Full JSON export
//!
//! The whole workspace as one document with an `export_info` header.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Budget, Category, CategoryRule, CurrencyConfig, Transaction};
use crate::storage::Storage;

pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Header describing an export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportInfo {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    pub workspace: String,
    pub transaction_count: usize,
    pub excluded_count: usize,
    pub rule_count: usize,
    pub category_count: usize,
    pub budget_count: usize,
    pub earliest_transaction: Option<String>,
    pub latest_transaction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub export_info: ExportInfo,
    pub transactions: Vec<Transaction>,
    pub rules: Vec<CategoryRule>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
    pub currencies: CurrencyConfig,
}

impl FullExport {
    pub fn from_storage(storage: &Storage) -> DashboardResult<Self> {
        let transactions = storage.transactions.get_all()?;
        let rules = storage.rules.get_all()?;
        let categories = storage.categories.get_all()?;
        let budgets = storage.budgets.get_all()?;
        let currencies = storage.currencies.get()?;

        let export_info = ExportInfo {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            workspace: storage.paths().base_dir().display().to_string(),
            transaction_count: transactions.len(),
            excluded_count: transactions.iter().filter(|t| !t.is_active()).count(),
            rule_count: rules.len(),
            category_count: categories.len(),
            budget_count: budgets.len(),
            earliest_transaction: transactions.iter().map(|t| t.date).min().map(|d| d.to_string()),
            latest_transaction: transactions.iter().map(|t| t.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            export_info,
            transactions,
            rules,
            categories,
            budgets,
            currencies,
        })
    }

    /// Check version and id uniqueness of a parsed export
    pub fn validate(&self) -> Result<(), String> {
        if self.export_info.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.export_info.schema_version
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.transactions.iter().find(|t| !seen.insert(t.id)) {
            return Err(format!("Duplicate transaction id {}", dup.id));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.rules.iter().find(|r| !seen.insert(r.id)) {
            return Err(format!("Duplicate rule id {}", dup.id));
        }

        if self.export_info.transaction_count != self.transactions.len() {
            return Err(format!(
                "Header lists {} transactions, found {}",
                self.export_info.transaction_count,
                self.transactions.len()
            ));
        }

        Ok(())
    }
}

pub fn export_full_json<W: Write>(storage: &Storage, writer: &mut W, pretty: bool) -> DashboardResult<()> {
    let export = FullExport::from_storage(storage)?;
    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| DashboardError::Export(e.to_string()))
}

/// Parse and validate a JSON export
pub fn import_from_json(json_str: &str) -> DashboardResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| DashboardError::Import(e.to_string()))?;
    export.validate().map_err(DashboardError::Import)?;
    Ok(export)
}
