//! Workspace information and housekeeping
//!
//! Counts, disk usage, document health and cleanup of stale files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::backup::BackupManager;
use crate::config::settings::BackupRetention;
use crate::error::DashboardResult;
use crate::models::CategorySource;
use crate::storage::file_io::json_file_valid;
use crate::storage::Storage;

/// State of one workspace document on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileHealth {
    Missing,
    Valid,
    /// Present but unparseable; loaded as empty
    Corrupt,
}

impl std::fmt::Display for FileHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Valid => write!(f, "ok"),
            Self::Corrupt => write!(f, "corrupt"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceInfo {
    pub path: PathBuf,
    pub transaction_count: usize,
    pub excluded_count: usize,
    pub uncategorized_count: usize,
    pub manual_count: usize,
    pub rule_count: usize,
    pub active_rule_count: usize,
    pub category_count: usize,
    pub budget_count: usize,
    pub currency_count: usize,
    pub backup_count: usize,
    pub last_backup: Option<DateTime<Utc>>,
    pub export_count: usize,
    pub total_size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub first_transaction: Option<NaiveDate>,
    pub last_transaction: Option<NaiveDate>,
}

impl WorkspaceInfo {
    pub fn total_size_mb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// What a cleanup removed
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub removed: Vec<PathBuf>,
    pub bytes_freed: u64,
}

pub struct WorkspaceService<'a> {
    storage: &'a Storage,
}

impl<'a> WorkspaceService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn info(&self, retention: &BackupRetention) -> DashboardResult<WorkspaceInfo> {
        let paths = self.storage.paths();
        let transactions = self.storage.transactions.get_all()?;
        let rules = self.storage.rules.get_all()?;
        let backups = BackupManager::new(paths.clone(), retention.clone()).list_backups()?;

        let mut usage = DirUsage::default();
        usage.scan(paths.base_dir());

        Ok(WorkspaceInfo {
            path: paths.base_dir().to_path_buf(),
            transaction_count: transactions.len(),
            excluded_count: transactions.iter().filter(|t| !t.is_active()).count(),
            uncategorized_count: transactions
                .iter()
                .filter(|t| t.is_active() && t.category.is_none())
                .count(),
            manual_count: transactions
                .iter()
                .filter(|t| t.category_source == CategorySource::Manual)
                .count(),
            rule_count: rules.len(),
            active_rule_count: rules.iter().filter(|r| r.active).count(),
            category_count: self.storage.categories.count()?,
            budget_count: self.storage.budgets.count()?,
            currency_count: self.storage.currencies.get()?.currencies.len(),
            backup_count: backups.len(),
            last_backup: backups.first().map(|b| b.created_at),
            export_count: count_files(&paths.export_dir()),
            total_size_bytes: usage.bytes,
            last_modified: usage.last_modified,
            first_transaction: transactions.iter().map(|t| t.date).min(),
            last_transaction: transactions.iter().map(|t| t.date).max(),
        })
    }

    /// Health of every workspace document
    pub fn check_files(&self) -> Vec<(&'static str, FileHealth)> {
        let paths = self.storage.paths();
        let mut files: Vec<(&'static str, PathBuf)> = paths.data_files().to_vec();
        files.push(("settings", paths.settings_file()));

        files
            .into_iter()
            .map(|(name, path)| {
                let health = if !path.exists() {
                    FileHealth::Missing
                } else if json_file_valid(&path) {
                    FileHealth::Valid
                } else {
                    FileHealth::Corrupt
                };
                (name, health)
            })
            .collect()
    }

    /// Remove leftover temp files and prune old backups
    pub fn clean(&self, retention: &BackupRetention) -> DashboardResult<CleanupResult> {
        let paths = self.storage.paths();
        let mut result = CleanupResult::default();

        for dir in [paths.base_dir().to_path_buf(), paths.data_dir(), paths.backup_dir()] {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let is_temp = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".tmp"));
                if !is_temp || !path.is_file() {
                    continue;
                }
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                match fs::remove_file(&path) {
                    Ok(()) => {
                        result.bytes_freed += size;
                        result.removed.push(path);
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "could not remove temp file"),
                }
            }
        }

        for path in BackupManager::new(paths.clone(), retention.clone()).enforce_retention()? {
            result.removed.push(path);
        }

        info!(removed = result.removed.len(), "cleaned workspace");
        Ok(result)
    }
}

#[derive(Default)]
struct DirUsage {
    bytes: u64,
    last_modified: Option<DateTime<Utc>>,
}

impl DirUsage {
    fn scan(&mut self, dir: &Path) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                self.scan(&entry.path());
            } else {
                self.bytes += meta.len();
                if let Ok(modified) = meta.modified() {
                    let modified: DateTime<Utc> = modified.into();
                    if self.last_modified.map_or(true, |m| modified > m) {
                        self.last_modified = Some(modified);
                    }
                }
            }
        }
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use crate::models::{Money, Transaction, TransactionStatus};
    use crate::storage::initialize_storage;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths).unwrap();
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_info_counts() {
        let (_temp_dir, storage) = create_test_storage();
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let mut excluded = Transaction::new(date, "dup", Money::from_cents(-100));
        excluded.set_status(TransactionStatus::Excluded);
        storage.transactions.insert(excluded).unwrap();
        storage
            .transactions
            .insert(Transaction::new(date, "spar", Money::from_cents(-200)))
            .unwrap();
        storage.save_all().unwrap();

        let retention = BackupRetention::default();
        BackupManager::new(storage.paths().clone(), retention.clone())
            .create_backup()
            .unwrap();

        let info = WorkspaceService::new(&storage).info(&retention).unwrap();
        assert_eq!(info.transaction_count, 2);
        assert_eq!(info.excluded_count, 1);
        assert_eq!(info.uncategorized_count, 1);
        assert!(info.rule_count > 0);
        assert_eq!(info.currency_count, 6);
        assert_eq!(info.backup_count, 1);
        assert!(info.last_backup.is_some());
        assert!(info.total_size_bytes > 0);
        assert_eq!(info.first_transaction, Some(date));
    }

    #[test]
    fn test_check_files_flags_corrupt() {
        let (temp_dir, storage) = create_test_storage();
        fs::write(temp_dir.path().join("data/budgets.json"), "{ nope").unwrap();

        let health = WorkspaceService::new(&storage).check_files();
        let lookup = |name: &str| health.iter().find(|(n, _)| *n == name).unwrap().1;
        assert_eq!(lookup("budgets"), FileHealth::Corrupt);
        assert_eq!(lookup("rules"), FileHealth::Valid);
        assert_eq!(lookup("settings"), FileHealth::Valid);
    }

    #[test]
    fn test_clean_removes_temp_and_old_backups() {
        let (temp_dir, storage) = create_test_storage();
        let stray = temp_dir.path().join("data/transactions.json.tmp");
        fs::write(&stray, "partial").unwrap();

        let retention = BackupRetention { keep: 1 };
        let manager = BackupManager::new(storage.paths().clone(), retention.clone());
        manager.create_backup().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        manager.create_backup().unwrap();

        let result = WorkspaceService::new(&storage).clean(&retention).unwrap();
        assert!(!stray.exists());
        assert_eq!(result.removed.len(), 2);
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }
}
