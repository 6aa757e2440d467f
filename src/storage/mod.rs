//! Storage layer for the finance dashboard
//!
//! JSON documents under the workspace data directory, written atomically.
//! Every repository keeps its contents behind an `RwLock` so services can
//! share one `&Storage`.

pub mod budgets;
pub mod categories;
pub mod currencies;
pub mod file_io;
pub mod init;
pub mod rules;
pub mod transactions;

pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use currencies::CurrencyRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use rules::RuleRepository;
pub use transactions::TransactionRepository;

use crate::config::paths::WorkspacePaths;
use crate::error::DashboardError;

pub(crate) fn lock_poisoned<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Storage(format!("Failed to acquire lock: {}", e))
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: WorkspacePaths,
    pub transactions: TransactionRepository,
    pub rules: RuleRepository,
    pub categories: CategoryRepository,
    pub budgets: BudgetRepository,
    pub currencies: CurrencyRepository,
}

impl Storage {
    /// Create a storage instance, making sure the workspace directories exist
    pub fn new(paths: WorkspacePaths) -> Result<Self, DashboardError> {
        paths.ensure_directories()?;

        Ok(Self {
            transactions: TransactionRepository::new(paths.transactions_file()),
            rules: RuleRepository::new(paths.rules_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            currencies: CurrencyRepository::new(paths.currencies_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Load every document from disk
    pub fn load_all(&self) -> Result<(), DashboardError> {
        self.transactions.load()?;
        self.rules.load()?;
        self.categories.load()?;
        self.budgets.load()?;
        self.currencies.load()?;
        Ok(())
    }

    /// Save every document to disk
    pub fn save_all(&self) -> Result<(), DashboardError> {
        self.transactions.save()?;
        self.rules.save()?;
        self.categories.save()?;
        self.budgets.save()?;
        self.currencies.save()?;
        Ok(())
    }

    /// True once the workspace has a settings file
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("backups").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_load_all_on_empty_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        storage.load_all().unwrap();
        assert_eq!(storage.transactions.count().unwrap(), 0);
        assert_eq!(storage.rules.count().unwrap(), 0);
        assert_eq!(storage.currencies.get().unwrap().base, "ZAR");

        storage.save_all().unwrap();
        assert!(storage.paths().transactions_file().exists());
        assert!(storage.paths().currencies_file().exists());
    }
}
