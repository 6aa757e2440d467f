//! Categorization rule repository
//!
//! Rules are persisted in rules.json as an ordered list. The list order is
//! the insertion order the categorizer uses to break ties, so it is
//! preserved exactly on load and save.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::DashboardError;
use crate::models::{CategoryRule, RuleId};

use super::file_io::{read_json_lenient, write_json_atomic};
use super::lock_poisoned;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct RuleData {
    pub(crate) rules: Vec<CategoryRule>,
}

/// Repository for the ordered rule list
pub struct RuleRepository {
    path: PathBuf,
    rules: RwLock<Vec<CategoryRule>>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Load rules from disk; a corrupt file loads as an empty rule set
    pub fn load(&self) -> Result<(), DashboardError> {
        let file_data: RuleData = read_json_lenient(&self.path);
        let mut rules = self.rules.write().map_err(lock_poisoned)?;
        *rules = file_data.rules;
        Ok(())
    }

    pub fn save(&self) -> Result<(), DashboardError> {
        let rules = self.rules.read().map_err(lock_poisoned)?;
        write_json_atomic(
            &self.path,
            &RuleData {
                rules: rules.clone(),
            },
        )
    }

    /// All rules in insertion order
    pub fn get_all(&self) -> Result<Vec<CategoryRule>, DashboardError> {
        Ok(self.rules.read().map_err(lock_poisoned)?.clone())
    }

    pub fn get(&self, id: RuleId) -> Result<Option<CategoryRule>, DashboardError> {
        let rules = self.rules.read().map_err(lock_poisoned)?;
        Ok(rules.iter().find(|r| r.id == id).cloned())
    }

    /// Find a rule by short id or by exact pattern (case-insensitive)
    pub fn find(&self, input: &str) -> Result<Option<CategoryRule>, DashboardError> {
        let rules = self.rules.read().map_err(lock_poisoned)?;
        let input = input.trim();
        Ok(rules
            .iter()
            .find(|r| r.id.matches(input))
            .or_else(|| rules.iter().find(|r| r.pattern.eq_ignore_ascii_case(input)))
            .cloned())
    }

    /// Find a rule with the same pattern (case-insensitive)
    pub fn find_by_pattern(&self, pattern: &str) -> Result<Option<CategoryRule>, DashboardError> {
        let rules = self.rules.read().map_err(lock_poisoned)?;
        let pattern = pattern.trim();
        Ok(rules
            .iter()
            .find(|r| r.pattern.eq_ignore_ascii_case(pattern))
            .cloned())
    }

    /// Append a rule at the end of the list
    pub fn push(&self, rule: CategoryRule) -> Result<(), DashboardError> {
        self.rules.write().map_err(lock_poisoned)?.push(rule);
        Ok(())
    }

    /// Replace a rule in place, keeping its position
    pub fn update(&self, rule: CategoryRule) -> Result<(), DashboardError> {
        let mut rules = self.rules.write().map_err(lock_poisoned)?;
        let slot = rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| DashboardError::rule_not_found(rule.id.to_string()))?;
        *slot = rule;
        Ok(())
    }

    /// Remove a rule, returning it
    pub fn remove(&self, id: RuleId) -> Result<CategoryRule, DashboardError> {
        let mut rules = self.rules.write().map_err(lock_poisoned)?;
        let index = rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| DashboardError::rule_not_found(id.to_string()))?;
        Ok(rules.remove(index))
    }

    pub fn count(&self) -> Result<usize, DashboardError> {
        Ok(self.rules.read().map_err(lock_poisoned)?.len())
    }
}
