//! Currency rate cache repository
//!
//! Persists the single CurrencyConfig document in currencies.json.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::DashboardError;
use crate::models::CurrencyConfig;

use super::file_io::{read_json_lenient, write_json_atomic};
use super::lock_poisoned;

/// Repository for the currency table
pub struct CurrencyRepository {
    path: PathBuf,
    config: RwLock<CurrencyConfig>,
}

impl CurrencyRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            config: RwLock::new(CurrencyConfig::default()),
        }
    }

    /// Load the table; a missing or corrupt file yields the built-in defaults
    pub fn load(&self) -> Result<(), DashboardError> {
        let config: CurrencyConfig = read_json_lenient(&self.path);
        *self.config.write().map_err(lock_poisoned)? = config;
        Ok(())
    }

    pub fn save(&self) -> Result<(), DashboardError> {
        let config = self.config.read().map_err(lock_poisoned)?;
        write_json_atomic(&self.path, &*config)
    }

    /// Snapshot of the current table
    pub fn get(&self) -> Result<CurrencyConfig, DashboardError> {
        Ok(self.config.read().map_err(lock_poisoned)?.clone())
    }

    /// Replace the whole table
    pub fn set(&self, config: CurrencyConfig) -> Result<(), DashboardError> {
        *self.config.write().map_err(lock_poisoned)? = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let repo = CurrencyRepository::new(temp_dir.path().join("currencies.json"));
        repo.load().unwrap();
        assert_eq!(repo.get().unwrap().currencies.len(), 6);
    }

    #[test]
    fn test_set_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("currencies.json");
        let repo = CurrencyRepository::new(path.clone());

        let mut config = repo.get().unwrap();
        config.default_code = "USD".into();
        repo.set(config).unwrap();
        repo.save().unwrap();

        let repo2 = CurrencyRepository::new(path);
        repo2.load().unwrap();
        assert_eq!(repo2.get().unwrap().default_code, "USD");
    }
}
