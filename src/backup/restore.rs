//! Restoring a workspace from a backup archive
//!
//! An archive is validated in full before anything is written, so a bad
//! archive never leaves the workspace half restored.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::paths::WorkspacePaths;
use crate::config::settings::Settings;
use crate::error::{DashboardError, DashboardResult};
use crate::models::CurrencyConfig;
use crate::storage::budgets::BudgetData;
use crate::storage::categories::CategoryData;
use crate::storage::rules::RuleData;
use crate::storage::transactions::TransactionData;
use crate::storage::write_json_atomic;

use super::manager::{BackupArchive, ARCHIVE_VERSION, SETTINGS_KEY};

/// Outcome of checking an archive
#[derive(Debug)]
pub struct ValidationResult {
    pub schema_version: u32,
    pub backup_date: DateTime<Utc>,
    /// Documents present with content
    pub present: Vec<String>,
    /// Expected documents that are absent or `null`
    pub missing: Vec<String>,
}

impl ValidationResult {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!("Complete backup (v{})", self.schema_version)
        } else {
            format!(
                "Partial backup (v{}): has {}, missing {}",
                self.schema_version,
                self.present.join(", "),
                self.missing.join(", ")
            )
        }
    }
}

/// Outcome of a restore
#[derive(Debug)]
pub struct RestoreResult {
    pub backup_date: DateTime<Utc>,
    pub restored: Vec<String>,
}

impl RestoreResult {
    pub fn summary(&self) -> String {
        format!("Restored: {}", self.restored.join(", "))
    }
}

/// Deserialize a document into the type its repository loads
fn check_document(name: &str, value: &serde_json::Value) -> DashboardResult<()> {
    let value = value.clone();
    let parsed = match name {
        "transactions" => serde_json::from_value::<TransactionData>(value).map(drop),
        "rules" => serde_json::from_value::<RuleData>(value).map(drop),
        "categories" => serde_json::from_value::<CategoryData>(value).map(drop),
        "budgets" => serde_json::from_value::<BudgetData>(value).map(drop),
        "currencies" => serde_json::from_value::<CurrencyConfig>(value).map(drop),
        SETTINGS_KEY => serde_json::from_value::<Settings>(value).map(drop),
        _ => Ok(()),
    };
    parsed.map_err(|e| {
        DashboardError::Validation(format!("Backup document '{}' is malformed: {}", name, e))
    })
}

pub struct RestoreManager {
    paths: WorkspacePaths,
}

impl RestoreManager {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    fn read_archive(&self, backup_path: &Path) -> DashboardResult<BackupArchive> {
        let contents = fs::read_to_string(backup_path)
            .map_err(|e| DashboardError::Io(format!("Failed to read backup file: {}", e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| DashboardError::Json(format!("Failed to parse backup file: {}", e)))
    }

    fn check(archive: &BackupArchive) -> DashboardResult<ValidationResult> {
        if archive.schema_version > ARCHIVE_VERSION {
            return Err(DashboardError::Validation(format!(
                "Backup format v{} is newer than supported v{}",
                archive.schema_version, ARCHIVE_VERSION
            )));
        }

        let mut present = Vec::new();
        let mut missing = Vec::new();
        for name in BackupArchive::expected_documents() {
            match archive.documents.get(name) {
                Some(value @ serde_json::Value::Object(_)) => {
                    check_document(name, value)?;
                    present.push(name.to_string());
                }
                None | Some(serde_json::Value::Null) => missing.push(name.to_string()),
                Some(_) => {
                    return Err(DashboardError::Validation(format!(
                        "Backup document '{}' is not a JSON object",
                        name
                    )))
                }
            }
        }

        Ok(ValidationResult {
            schema_version: archive.schema_version,
            backup_date: archive.created_at,
            present,
            missing,
        })
    }

    /// Check an archive without touching the workspace
    pub fn validate_backup(&self, backup_path: &Path) -> DashboardResult<ValidationResult> {
        Self::check(&self.read_archive(backup_path)?)
    }

    /// Overwrite workspace documents with the archive's contents
    ///
    /// Documents missing from the archive are left as they are. Callers
    /// must reload `Storage` afterwards.
    pub fn restore_from_file(&self, backup_path: &Path) -> DashboardResult<RestoreResult> {
        let archive = self.read_archive(backup_path)?;
        Self::check(&archive)?;
        self.paths.ensure_directories()?;

        let mut targets: Vec<(&str, std::path::PathBuf)> = self.paths.data_files().to_vec();
        targets.push((SETTINGS_KEY, self.paths.settings_file()));

        let mut restored = Vec::new();
        for (name, path) in targets {
            if let Some(value) = archive.documents.get(name).filter(|v| v.is_object()) {
                write_json_atomic(&path, value)?;
                restored.push(name.to_string());
            }
        }

        info!(
            backup = %backup_path.display(),
            restored = restored.len(),
            "restored workspace from backup"
        );
        Ok(RestoreResult {
            backup_date: archive.created_at,
            restored,
        })
    }
}
