//! Category registry repository
//!
//! Persists categories and their labels in categories.json.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::DashboardError;
use crate::models::category::normalize_name;
use crate::models::Category;

use super::file_io::{read_json_lenient, write_json_atomic};
use super::lock_poisoned;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct CategoryData {
    pub(crate) categories: Vec<Category>,
}

/// Repository for the category registry
pub struct CategoryRepository {
    path: PathBuf,
    categories: RwLock<Vec<Category>>,
}

impl CategoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            categories: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> Result<(), DashboardError> {
        let file_data: CategoryData = read_json_lenient(&self.path);
        *self.categories.write().map_err(lock_poisoned)? = file_data.categories;
        Ok(())
    }

    pub fn save(&self) -> Result<(), DashboardError> {
        let categories = self.categories.read().map_err(lock_poisoned)?;
        write_json_atomic(
            &self.path,
            &CategoryData {
                categories: categories.clone(),
            },
        )
    }

    /// All categories sorted by name
    pub fn get_all(&self) -> Result<Vec<Category>, DashboardError> {
        let mut categories = self.categories.read().map_err(lock_poisoned)?.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    /// Look up a category by name (normalized)
    pub fn get(&self, name: &str) -> Result<Option<Category>, DashboardError> {
        let name = normalize_name(name);
        let categories = self.categories.read().map_err(lock_poisoned)?;
        Ok(categories.iter().find(|c| c.name == name).cloned())
    }

    /// Insert or replace a category by name
    pub fn upsert(&self, category: Category) -> Result<(), DashboardError> {
        let mut categories = self.categories.write().map_err(lock_poisoned)?;
        match categories.iter_mut().find(|c| c.name == category.name) {
            Some(slot) => *slot = category,
            None => categories.push(category),
        }
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<Category, DashboardError> {
        let name = normalize_name(name);
        let mut categories = self.categories.write().map_err(lock_poisoned)?;
        let index = categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| DashboardError::category_not_found(name.clone()))?;
        Ok(categories.remove(index))
    }

    pub fn count(&self) -> Result<usize, DashboardError> {
        Ok(self.categories.read().map_err(lock_poisoned)?.len())
    }
}
