//! Workspace backups
//!
//! - `BackupManager` snapshots every workspace document into a single JSON
//!   archive, lists archives and prunes all but the newest N.
//! - `RestoreManager` validates an archive and writes its documents back.
//!
//! The retention count comes from `Settings::backup_retention`.

mod manager;
mod restore;

pub use manager::{BackupArchive, BackupInfo, BackupManager};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
