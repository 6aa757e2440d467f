//! Path management for the workspace
//!
//! A workspace is a single directory holding every persisted JSON document
//! for one dashboard instance.
//!
//! ## Path Resolution Order
//!
//! 1. An explicit directory passed on the command line
//! 2. `INOUT_WORKSPACE` environment variable (if set)
//! 3. `<home>/financial_workspace`

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::DashboardError;

/// Environment variable that overrides the workspace location
pub const WORKSPACE_ENV: &str = "INOUT_WORKSPACE";

/// Manages all paths used inside a workspace
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    base_dir: PathBuf,
}

impl WorkspacePaths {
    /// Resolve the workspace from the environment or the home directory
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, DashboardError> {
        let base_dir = match std::env::var(WORKSPACE_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create WorkspacePaths with a custom base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the workspace root
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the data directory (<workspace>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the backup directory (<workspace>/backups/)
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the export directory (<workspace>/exports/)
    pub fn export_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to transactions.json
    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    /// Get the path to rules.json (categorization rules)
    pub fn rules_file(&self) -> PathBuf {
        self.data_dir().join("rules.json")
    }

    /// Get the path to categories.json (category registry)
    pub fn categories_file(&self) -> PathBuf {
        self.data_dir().join("categories.json")
    }

    /// Get the path to budgets.json
    pub fn budgets_file(&self) -> PathBuf {
        self.data_dir().join("budgets.json")
    }

    /// Get the path to currencies.json (rate cache)
    pub fn currencies_file(&self) -> PathBuf {
        self.data_dir().join("currencies.json")
    }

    /// All data documents, in backup order
    pub fn data_files(&self) -> [(&'static str, PathBuf); 5] {
        [
            ("transactions", self.transactions_file()),
            ("rules", self.rules_file()),
            ("categories", self.categories_file()),
            ("budgets", self.budgets_file()),
            ("currencies", self.currencies_file()),
        ]
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), DashboardError> {
        for dir in [
            self.base_dir.clone(),
            self.data_dir(),
            self.backup_dir(),
            self.export_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                DashboardError::Io(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Check if the workspace has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, DashboardError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| DashboardError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join("financial_workspace"))
}
