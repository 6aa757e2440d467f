//! Backup creation, listing and retention
//!
//! A backup is one JSON archive holding every workspace document, stored
//! as `backups/backup-YYYYMMDD-HHMMSS-mmm.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::paths::WorkspacePaths;
use crate::config::settings::BackupRetention;
use crate::error::{DashboardError, DashboardResult};
use crate::storage::write_json_atomic;

/// Archive format version
pub const ARCHIVE_VERSION: u32 = 1;

/// Key under which `config.json` is stored in an archive
pub const SETTINGS_KEY: &str = "settings";

/// A listed backup file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    /// Parsed from the filename
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// On-disk backup format
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupArchive {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    /// Document name (`transactions`, `rules`, ..., `settings`) to its JSON;
    /// `null` when the file did not exist at backup time
    pub documents: BTreeMap<String, serde_json::Value>,
}

impl BackupArchive {
    /// Names every archive must carry
    pub fn expected_documents() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = WorkspacePaths::with_base_dir(PathBuf::new())
            .data_files()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        names.push(SETTINGS_KEY);
        names
    }
}

/// Creates, lists and prunes backups of one workspace
pub struct BackupManager {
    paths: WorkspacePaths,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(paths: WorkspacePaths, retention: BackupRetention) -> Self {
        Self { paths, retention }
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.paths.backup_dir()
    }

    /// Snapshot every document into a new archive and return its path
    ///
    /// Callers should save in-memory state first so the archive matches it.
    pub fn create_backup(&self) -> DashboardResult<PathBuf> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir).map_err(|e| {
            DashboardError::Io(format!("Failed to create backup directory: {}", e))
        })?;

        let now = Utc::now();
        let filename = format!(
            "backup-{}-{:03}.json",
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let backup_path = backup_dir.join(&filename);

        let mut documents = BTreeMap::new();
        for (name, path) in self.paths.data_files() {
            documents.insert(name.to_string(), read_document(&path)?);
        }
        documents.insert(
            SETTINGS_KEY.to_string(),
            read_document(&self.paths.settings_file())?,
        );

        let archive = BackupArchive {
            schema_version: ARCHIVE_VERSION,
            created_at: now,
            documents,
        };
        write_json_atomic(&backup_path, &archive)?;

        info!(path = %backup_path.display(), "created backup");
        Ok(backup_path)
    }

    /// All backups, newest first
    pub fn list_backups(&self) -> DashboardResult<Vec<BackupInfo>> {
        let backup_dir = self.backup_dir();
        if !backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&backup_dir)
            .map_err(|e| DashboardError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| DashboardError::Io(format!("Failed to read directory entry: {}", e)))?;
            if let Some(info) = backup_info(&entry.path()) {
                backups.push(info);
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Resolve a backup by filename, or by 1-based position in the listing
    pub fn find_backup(&self, input: &str) -> DashboardResult<BackupInfo> {
        let input = input.trim();
        let backups = self.list_backups()?;

        if let Ok(index) = input.parse::<usize>() {
            if index >= 1 && index <= backups.len() {
                return Ok(backups[index - 1].clone());
            }
        }

        backups
            .into_iter()
            .find(|b| b.filename == input)
            .ok_or_else(|| DashboardError::NotFound {
                entity_type: "Backup",
                identifier: input.to_string(),
            })
    }

    /// Delete all but the newest `keep` backups; returns the deleted paths
    pub fn enforce_retention(&self) -> DashboardResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        for backup in self.list_backups()?.into_iter().skip(self.retention.keep) {
            fs::remove_file(&backup.path)
                .map_err(|e| DashboardError::Io(format!("Failed to delete old backup: {}", e)))?;
            deleted.push(backup.path);
        }
        if !deleted.is_empty() {
            info!(deleted = deleted.len(), keep = self.retention.keep, "pruned old backups");
        }
        Ok(deleted)
    }

    /// Create a backup and prune old ones
    pub fn create_backup_with_retention(&self) -> DashboardResult<(PathBuf, Vec<PathBuf>)> {
        let path = self.create_backup()?;
        let deleted = self.enforce_retention()?;
        Ok((path, deleted))
    }
}

/// Read a document as raw JSON; a missing file becomes `null`
///
/// A corrupt document is stored as `null` too, with a warning, so one bad
/// file does not block backing up the rest.
fn read_document(path: &Path) -> DashboardResult<serde_json::Value> {
    if !path.exists() {
        return Ok(serde_json::Value::Null);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| DashboardError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    match serde_json::from_str(&contents) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt document left out of backup");
            Ok(serde_json::Value::Null)
        }
    }
}

fn backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_str()?.to_string();
    let stamp = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS-mmm` (milliseconds optional)
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let mut parts = stamp.split('-');
    let date = NaiveDate::parse_from_str(parts.next()?, "%Y%m%d").ok()?;
    let time_part = parts.next()?;
    let millis = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || time_part.len() != 6 {
        return None;
    }

    let hour = time_part[0..2].parse().ok()?;
    let minute = time_part[2..4].parse().ok()?;
    let second = time_part[4..6].parse().ok()?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;

    Some(NaiveDateTime::new(date, time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    fn create_test_manager(keep: usize) -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        (BackupManager::new(paths, BackupRetention { keep }), temp_dir)
    }

    #[test]
    fn test_create_backup_holds_every_document() {
        let (manager, temp) = create_test_manager(10);
        fs::write(temp.path().join("data/rules.json"), r#"{"rules": []}"#).unwrap();

        let path = manager.create_backup().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("backup-") && name.ends_with(".json"));

        let archive: BackupArchive =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(archive.schema_version, ARCHIVE_VERSION);
        for name in BackupArchive::expected_documents() {
            assert!(archive.documents.contains_key(name), "missing {}", name);
        }
        assert!(archive.documents["rules"].is_object());
        assert!(archive.documents["transactions"].is_null());
    }

    #[test]
    fn test_list_newest_first() {
        let (manager, _temp) = create_test_manager(10);
        manager.create_backup().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let newest = manager.create_backup().unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].path, newest);
        assert_eq!(manager.find_backup("1").unwrap().path, newest);
        assert!(manager.find_backup("backup-nope.json").unwrap_err().is_not_found());
    }

    #[test]
    fn test_retention_keeps_newest() {
        let (manager, _temp) = create_test_manager(2);
        for _ in 0..4 {
            manager.create_backup().unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        let deleted = manager.enforce_retention().unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(manager.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn test_ignores_foreign_files() {
        let (manager, temp) = create_test_manager(10);
        fs::write(temp.path().join("backups/notes.txt"), "hi").unwrap();
        fs::write(temp.path().join("backups/backup-garbage.json"), "{}").unwrap();
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let ts = parse_backup_timestamp("20251127-143022-456").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 11, 27));
        assert_eq!(ts.nanosecond(), 456_000_000);
        assert!(parse_backup_timestamp("20251127-143022").is_some());
        assert!(parse_backup_timestamp("20251127").is_none());
        assert!(parse_backup_timestamp("20251327-143022").is_none());
    }
}
