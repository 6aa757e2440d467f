//! User settings for the dashboard
//!
//! Manages import profiles, budget thresholds, the entity list, report
//! preferences, tax deduction rules and backup retention. Stored as
//! `config.json` at the workspace root.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::paths::WorkspacePaths;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{BudgetBasis, Entity, EntityKind, Money};
use crate::services::import::BankProfile;
use crate::services::tax::DeductionRule;
use crate::storage::file_io::{read_json_required, write_json_atomic};

/// CSV import preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Profile used when none is chosen explicitly
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    /// Named bank profiles
    #[serde(default = "BankProfile::builtins")]
    pub profiles: BTreeMap<String, BankProfile>,

    /// Run the categorizer on newly imported rows
    #[serde(default = "default_true")]
    pub auto_categorize: bool,

    /// Skip rows whose fingerprint is already in the store
    #[serde(default = "default_true")]
    pub duplicate_detection: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            profiles: BankProfile::builtins(),
            auto_categorize: true,
            duplicate_detection: true,
        }
    }
}

impl ImportSettings {
    /// Look up a profile by name, falling back to the default profile
    pub fn profile(&self, name: Option<&str>) -> DashboardResult<BankProfile> {
        let name = name.unwrap_or(&self.default_profile).trim().to_lowercase();
        self.profiles
            .get(&name)
            .cloned()
            .ok_or(DashboardError::NotFound {
                entity_type: "Bank profile",
                identifier: name,
            })
    }
}

/// Budget evaluation preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSettings {
    #[serde(default)]
    pub basis: BudgetBasis,

    /// Fraction of target at which a budget turns to "warning"
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,

    /// Fraction of target above which a budget is "over"
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            basis: BudgetBasis::default(),
            warning_threshold: default_warning_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

/// Report preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// How many rows a top-N ranking shows
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

/// Tax calculation preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Deductible categories and their statutory caps
    #[serde(default = "DeductionRule::defaults")]
    pub deductions: Vec<DeductionRule>,

    /// Primary rebate subtracted from the bracket liability
    #[serde(default = "default_primary_rebate")]
    pub primary_rebate: Money,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            deductions: DeductionRule::defaults(),
            primary_rebate: default_primary_rebate(),
        }
    }
}

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of most recent backups to keep when cleaning
    pub keep: usize,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { keep: 10 }
    }
}

/// User settings for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Date format preference for display (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub import: ImportSettings,

    #[serde(default)]
    pub budget: BudgetSettings,

    /// Household members and business units
    #[serde(default = "Entity::defaults")]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub reports: ReportSettings,

    #[serde(default)]
    pub tax: TaxSettings,

    #[serde(default)]
    pub backup_retention: BackupRetention,
}

fn default_schema_version() -> u32 {
    1
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_profile_name() -> String {
    "generic".to_string()
}

fn default_true() -> bool {
    true
}

fn default_warning_threshold() -> f64 {
    0.8
}

fn default_critical_threshold() -> f64 {
    1.0
}

fn default_top_n() -> usize {
    5
}

fn default_primary_rebate() -> Money {
    Money::from_units(17_235)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            date_format: default_date_format(),
            import: ImportSettings::default(),
            budget: BudgetSettings::default(),
            entities: Entity::defaults(),
            reports: ReportSettings::default(),
            tax: TaxSettings::default(),
            backup_retention: BackupRetention::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk
    ///
    /// A missing file yields defaults. A corrupt file is logged and also
    /// yields defaults; it is overwritten on the next save.
    pub fn load_or_create(paths: &WorkspacePaths) -> DashboardResult<Self> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| DashboardError::Io(format!("Failed to read settings file: {}", e)))?;

        match serde_json::from_str::<Settings>(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(
                    path = %settings_path.display(),
                    error = %e,
                    "settings file is corrupt, using defaults"
                );
                Ok(Settings::default())
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &WorkspacePaths) -> DashboardResult<()> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Find an entity by name (case-insensitive)
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_named(name))
    }

    /// Add an entity, rejecting blank and duplicate names
    pub fn add_entity(&mut self, name: &str, kind: EntityKind) -> DashboardResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::Validation(
                "Entity name cannot be empty".into(),
            ));
        }
        if self.entity(name).is_some() {
            return Err(DashboardError::Duplicate {
                entity_type: "Entity",
                identifier: name.to_string(),
            });
        }
        self.entities.push(Entity::new(name, kind));
        Ok(())
    }

    /// Remove an entity by name
    pub fn remove_entity(&mut self, name: &str) -> DashboardResult<Entity> {
        let index = self
            .entities
            .iter()
            .position(|e| e.is_named(name))
            .ok_or_else(|| DashboardError::NotFound {
                entity_type: "Entity",
                identifier: name.trim().to_string(),
            })?;
        Ok(self.entities.remove(index))
    }

    /// Set the budget thresholds, keeping warning at or below critical
    pub fn set_thresholds(&mut self, warning: f64, critical: f64) -> DashboardResult<()> {
        if !(warning > 0.0 && critical > 0.0 && warning <= critical) {
            return Err(DashboardError::Validation(format!(
                "Thresholds must be positive with warning <= critical (got {} / {})",
                warning, critical
            )));
        }
        self.budget.warning_threshold = warning;
        self.budget.critical_threshold = critical;
        Ok(())
    }
}

impl Settings {
    /// Replace every setting with its default
    pub fn reset_to_defaults(&mut self) {
        *self = Settings::default();
    }

    /// Write the settings to an arbitrary file
    pub fn export_to(&self, path: &Path) -> DashboardResult<()> {
        write_json_atomic(path, self)?;
        info!(path = %path.display(), "exported settings");
        Ok(())
    }

    /// Settings read from `path`
    ///
    /// With `merge`, the file is deep-merged over the current settings so a
    /// partial file only changes the keys it names. Without it, keys the file
    /// omits fall back to their defaults. Nothing is applied here; the caller
    /// decides whether to keep the result.
    pub fn import_from(&self, path: &Path, merge: bool) -> DashboardResult<Settings> {
        let incoming: Value = read_json_required(path)?;
        if !incoming.is_object() {
            return Err(DashboardError::Validation(format!(
                "{} does not contain a settings object",
                path.display()
            )));
        }

        let combined = if merge {
            let mut base = serde_json::to_value(self)?;
            deep_merge(&mut base, incoming);
            base
        } else {
            incoming
        };

        let mut imported: Settings = serde_json::from_value(combined).map_err(|e| {
            DashboardError::Validation(format!("Invalid settings in {}: {}", path.display(), e))
        })?;
        let (warning, critical) = (
            imported.budget.warning_threshold,
            imported.budget.critical_threshold,
        );
        imported.set_thresholds(warning, critical)?;
        Ok(imported)
    }
}

/// Merge `update` into `base`: nested objects merge key by key, anything
/// else replaces the existing value
fn deep_merge(base: &mut Value, update: Value) {
    match (base, update) {
        (Value::Object(base), Value::Object(update)) => {
            for (key, value) in update {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, update) => *base = update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deep_merge_keeps_untouched_keys() {
        let mut base = serde_json::json!({"budget": {"basis": "net", "warning_threshold": 0.8}, "reports": {"top_n": 5}});
        deep_merge(&mut base, serde_json::json!({"budget": {"warning_threshold": 0.5}}));
        assert_eq!(base["budget"]["basis"], "net");
        assert_eq!(base["budget"]["warning_threshold"], 0.5);
        assert_eq!(base["reports"]["top_n"], 5);
    }

    #[test]
    fn test_export_then_import_replace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.reports.top_n = 3;
        settings.export_to(&path).unwrap();

        let imported = Settings::default().import_from(&path, false).unwrap();
        assert_eq!(imported.reports.top_n, 3);
    }

    #[test]
    fn test_import_rejects_bad_thresholds_and_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.json");
        std::fs::write(&path, r#"{"budget": {"warning_threshold": 2.0}}"#).unwrap();

        assert!(Settings::default().import_from(&path, true).unwrap_err().is_validation());
        assert!(Settings::default()
            .import_from(&temp_dir.path().join("missing.json"), true)
            .is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.budget.basis, BudgetBasis::ExpensesOnly);
        assert_eq!(settings.budget.warning_threshold, 0.8);
        assert_eq!(settings.budget.critical_threshold, 1.0);
        assert_eq!(settings.backup_retention.keep, 10);
        assert_eq!(settings.entities.len(), 5);
        assert!(settings.import.auto_categorize);
        assert!(settings.import.profiles.contains_key("generic"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.budget.basis = BudgetBasis::Net;
        settings.reports.top_n = 3;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.budget.basis, BudgetBasis::Net);
        assert_eq!(loaded.reports.top_n, 3);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "{ not json").unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.reports.top_n, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"reports": {"top_n": 7}}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.reports.top_n, 7);
        assert_eq!(loaded.entities.len(), 5);
        assert_eq!(loaded.tax.deductions.len(), 2);
    }

    #[test]
    fn test_entity_management() {
        let mut settings = Settings::default();
        settings.add_entity("Gran", EntityKind::Person).unwrap();
        assert!(settings.entity("gran").is_some());

        assert!(matches!(
            settings.add_entity("DAD", EntityKind::Person),
            Err(DashboardError::Duplicate { .. })
        ));
        assert!(settings.add_entity("  ", EntityKind::Person).is_err());

        let removed = settings.remove_entity("gran").unwrap();
        assert_eq!(removed.name, "Gran");
        assert!(settings.remove_entity("gran").unwrap_err().is_not_found());
    }

    #[test]
    fn test_profile_lookup() {
        let settings = Settings::default();
        assert!(settings.import.profile(None).is_ok());
        assert!(settings.import.profile(Some("FNB")).is_ok());
        assert!(settings.import.profile(Some("nope")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_thresholds() {
        let mut settings = Settings::default();
        settings.set_thresholds(0.5, 0.9).unwrap();
        assert_eq!(settings.budget.warning_threshold, 0.5);
        assert!(settings.set_thresholds(0.9, 0.5).is_err());
    }
}
