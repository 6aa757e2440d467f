//! Category service
//!
//! Business logic for the category registry, the categorization rule list
//! and per-transaction category overrides.

use tracing::{debug, info};

use crate::error::{DashboardError, DashboardResult};
use crate::models::category::{normalize_name, split_path, validate_name};
use crate::models::{
    category_matches, Category, CategoryRule, Label, Transaction, TransactionStatus,
};
use crate::services::categorizer::{Categorization, Categorizer};
use crate::storage::Storage;

/// Field changes for an existing rule; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub pattern: Option<String>,
    pub category: Option<String>,
    /// `Some(None)` clears the entity
    pub entity: Option<Option<String>>,
    pub active: Option<bool>,
}

/// Counts from a recategorization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecategorizeSummary {
    pub examined: usize,
    pub changed: usize,
    pub manual_skipped: usize,
    pub uncategorized: usize,
}

/// Service for categories, rules and overrides
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // === Registry ===

    pub fn list_categories(&self) -> DashboardResult<Vec<Category>> {
        self.storage.categories.get_all()
    }

    pub fn get_category(&self, name: &str) -> DashboardResult<Category> {
        self.storage
            .categories
            .get(name)?
            .ok_or_else(|| DashboardError::category_not_found(name.trim()))
    }

    pub fn create_category(&self, name: &str, description: &str) -> DashboardResult<Category> {
        let category = Category::new(name, description.trim());
        category
            .validate()
            .map_err(|e| DashboardError::Validation(e.to_string()))?;

        if self.storage.categories.get(&category.name)?.is_some() {
            return Err(DashboardError::Duplicate {
                entity_type: "Category",
                identifier: category.name,
            });
        }

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        info!(category = %category.name, "created category");
        Ok(category)
    }

    pub fn update_description(&self, name: &str, description: &str) -> DashboardResult<Category> {
        let mut category = self.get_category(name)?;
        category.description = description.trim().to_string();
        category.updated_at = chrono::Utc::now();
        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        Ok(category)
    }

    /// Activate or deactivate a category
    pub fn set_category_active(&self, name: &str, active: bool) -> DashboardResult<Category> {
        let mut category = self.get_category(name)?;
        category.active = active;
        category.updated_at = chrono::Utc::now();
        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        Ok(category)
    }

    /// Number of active transactions and rules referring to a category path
    pub fn usage(&self, path: &str) -> DashboardResult<(usize, usize)> {
        let transactions = self
            .storage
            .transactions
            .get_active()?
            .iter()
            .filter(|t| {
                t.category
                    .as_deref()
                    .is_some_and(|c| category_matches(path, c))
            })
            .count();
        let rules = self
            .storage
            .rules
            .get_all()?
            .iter()
            .filter(|r| category_matches(path, &r.category))
            .count();
        Ok((transactions, rules))
    }

    /// Delete a category; refused while in use unless forced
    pub fn delete_category(&self, name: &str, force: bool) -> DashboardResult<Category> {
        let category = self.get_category(name)?;
        let (transactions, rules) = self.usage(&category.name)?;
        if !force && (transactions > 0 || rules > 0) {
            return Err(DashboardError::Validation(format!(
                "Category '{}' is used by {} transactions and {} rules",
                category.name, transactions, rules
            )));
        }
        let removed = self.storage.categories.remove(&category.name)?;
        self.storage.categories.save()?;
        info!(category = %removed.name, "deleted category");
        Ok(removed)
    }

    pub fn add_label(&self, category: &str, name: &str, description: &str) -> DashboardResult<Label> {
        let mut cat = self.get_category(category)?;
        let label = Label::new(name, description.trim());
        validate_name(&label.name).map_err(|e| DashboardError::Validation(e.to_string()))?;

        if cat.label(&label.name).is_some() {
            return Err(DashboardError::Duplicate {
                entity_type: "Label",
                identifier: format!("{}/{}", cat.name, label.name),
            });
        }

        cat.labels.push(label.clone());
        cat.updated_at = chrono::Utc::now();
        self.storage.categories.upsert(cat)?;
        self.storage.categories.save()?;
        Ok(label)
    }

    pub fn set_label_active(&self, category: &str, name: &str, active: bool) -> DashboardResult<()> {
        let mut cat = self.get_category(category)?;
        let path = format!("{}/{}", cat.name, normalize_name(name));
        let label = cat
            .label_mut(name)
            .ok_or_else(|| DashboardError::category_not_found(path))?;
        label.active = active;
        cat.updated_at = chrono::Utc::now();
        self.storage.categories.upsert(cat)?;
        self.storage.categories.save()
    }

    pub fn remove_label(&self, category: &str, name: &str, force: bool) -> DashboardResult<Label> {
        let mut cat = self.get_category(category)?;
        let path = format!("{}/{}", cat.name, normalize_name(name));
        let index = cat
            .labels
            .iter()
            .position(|l| l.name == normalize_name(name))
            .ok_or_else(|| DashboardError::category_not_found(path.clone()))?;

        let (transactions, rules) = self.usage(&path)?;
        if !force && (transactions > 0 || rules > 0) {
            return Err(DashboardError::Validation(format!(
                "Label '{}' is used by {} transactions and {} rules",
                path, transactions, rules
            )));
        }

        let label = cat.labels.remove(index);
        cat.updated_at = chrono::Utc::now();
        self.storage.categories.upsert(cat)?;
        self.storage.categories.save()?;
        Ok(label)
    }

    /// Check that a `category` or `category/label` path names registered,
    /// active entries
    pub fn validate_path(&self, path: &str) -> DashboardResult<()> {
        let (category, label) = split_path(path);
        let cat = self.get_category(category)?;
        if !cat.active {
            return Err(DashboardError::Validation(format!(
                "Category '{}' is inactive",
                cat.name
            )));
        }
        if let Some(label) = label {
            match cat.label(label) {
                Some(l) if l.active => {}
                Some(_) => {
                    return Err(DashboardError::Validation(format!(
                        "Label '{}/{}' is inactive",
                        cat.name, label
                    )))
                }
                None => {
                    return Err(DashboardError::category_not_found(format!(
                        "{}/{}",
                        cat.name, label
                    )))
                }
            }
        }
        Ok(())
    }

    // === Rules ===

    /// Rules in insertion order
    pub fn list_rules(&self) -> DashboardResult<Vec<CategoryRule>> {
        self.storage.rules.get_all()
    }

    /// Active rules in the order the categorizer tries them
    pub fn rules_by_priority(&self) -> DashboardResult<Vec<CategoryRule>> {
        let mut rules: Vec<_> = self
            .storage
            .rules
            .get_all()?
            .into_iter()
            .filter(|r| r.active)
            .collect();
        rules.sort_by_key(|r| std::cmp::Reverse(r.specificity()));
        Ok(rules)
    }

    pub fn find_rule(&self, input: &str) -> DashboardResult<CategoryRule> {
        self.storage
            .rules
            .find(input)?
            .ok_or_else(|| DashboardError::rule_not_found(input.trim()))
    }

    /// Append a rule after validating its pattern and category path
    pub fn add_rule(
        &self,
        pattern: &str,
        category: &str,
        entity: Option<&str>,
    ) -> DashboardResult<CategoryRule> {
        let rule = CategoryRule::new(pattern, category, entity.map(str::to_string));
        rule.validate()
            .map_err(|e| DashboardError::Validation(e.to_string()))?;
        self.validate_path(&rule.category)?;

        if self.storage.rules.find_by_pattern(&rule.pattern)?.is_some() {
            return Err(DashboardError::Duplicate {
                entity_type: "Rule",
                identifier: rule.pattern,
            });
        }

        self.storage.rules.push(rule.clone())?;
        self.storage.rules.save()?;
        info!(rule = %rule, "added rule");
        Ok(rule)
    }

    pub fn update_rule(&self, input: &str, update: RuleUpdate) -> DashboardResult<CategoryRule> {
        let mut rule = self.find_rule(input)?;

        if let Some(pattern) = update.pattern {
            let pattern = pattern.trim().to_string();
            if let Some(other) = self.storage.rules.find_by_pattern(&pattern)? {
                if other.id != rule.id {
                    return Err(DashboardError::Duplicate {
                        entity_type: "Rule",
                        identifier: pattern,
                    });
                }
            }
            rule.pattern = pattern;
        }
        if let Some(category) = update.category {
            self.validate_path(&category)?;
            rule.category = category.trim().to_string();
        }
        if let Some(entity) = update.entity {
            rule.entity = entity
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty());
        }
        if let Some(active) = update.active {
            rule.active = active;
        }

        rule.validate()
            .map_err(|e| DashboardError::Validation(e.to_string()))?;
        self.storage.rules.update(rule.clone())?;
        self.storage.rules.save()?;
        Ok(rule)
    }

    pub fn remove_rule(&self, input: &str) -> DashboardResult<CategoryRule> {
        let rule = self.find_rule(input)?;
        let removed = self.storage.rules.remove(rule.id)?;
        self.storage.rules.save()?;
        info!(rule = %removed, "removed rule");
        Ok(removed)
    }

    /// Show which rule a description would match
    pub fn test_description(&self, description: &str) -> DashboardResult<Categorization> {
        let categorizer = Categorizer::new(&self.storage.rules.get_all()?);
        Ok(categorizer.categorize(description))
    }

    // === Transactions ===

    /// Re-apply the rule set to every active, non-manual transaction
    pub fn recategorize_all(&self) -> DashboardResult<RecategorizeSummary> {
        let categorizer = Categorizer::new(&self.storage.rules.get_all()?);
        let mut summary = RecategorizeSummary::default();

        for mut txn in self.storage.transactions.get_active()? {
            summary.examined += 1;
            if txn.is_manual() {
                summary.manual_skipped += 1;
                continue;
            }

            let (category, entity) = categorizer.categorize(&txn.description).assignment();
            if category.is_none() {
                summary.uncategorized += 1;
            }
            if txn.apply_auto(category, entity) {
                debug!(id = %txn.id, category = ?txn.category, "recategorized");
                summary.changed += 1;
                self.storage.transactions.update(txn)?;
            }
        }

        if summary.changed > 0 {
            self.storage.transactions.save()?;
        }
        info!(
            examined = summary.examined,
            changed = summary.changed,
            manual = summary.manual_skipped,
            "recategorization finished"
        );
        Ok(summary)
    }

    pub fn find_transaction(&self, input: &str) -> DashboardResult<Transaction> {
        self.storage
            .transactions
            .find(input)?
            .ok_or_else(|| DashboardError::transaction_not_found(input.trim()))
    }

    /// Record a manual override; automatic passes leave it alone
    pub fn set_manual_category(
        &self,
        input: &str,
        category: Option<&str>,
        entity: Option<&str>,
    ) -> DashboardResult<Transaction> {
        let mut txn = self.find_transaction(input)?;
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        if let Some(path) = category {
            self.validate_path(path)?;
        }
        let entity = entity
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        txn.apply_manual(category.map(str::to_string), entity);
        self.storage.transactions.update(txn.clone())?;
        self.storage.transactions.save()?;
        info!(id = %txn.id, category = ?txn.category, "manual category set");
        Ok(txn)
    }

    /// Drop a manual override and categorize the transaction automatically
    pub fn clear_override(&self, input: &str) -> DashboardResult<Transaction> {
        let mut txn = self.find_transaction(input)?;
        let (category, entity) = self.test_description(&txn.description)?.assignment();
        txn.apply_auto(category, entity);
        self.storage.transactions.update(txn.clone())?;
        self.storage.transactions.save()?;
        Ok(txn)
    }

    /// Soft-remove a transaction from every aggregation
    pub fn exclude_transaction(&self, input: &str) -> DashboardResult<Transaction> {
        self.set_status(input, TransactionStatus::Excluded)
    }

    pub fn restore_transaction(&self, input: &str) -> DashboardResult<Transaction> {
        self.set_status(input, TransactionStatus::Active)
    }

    fn set_status(&self, input: &str, status: TransactionStatus) -> DashboardResult<Transaction> {
        let mut txn = self.find_transaction(input)?;
        if txn.status != status {
            txn.set_status(status);
            self.storage.transactions.update(txn.clone())?;
            self.storage.transactions.save()?;
        }
        Ok(txn)
    }

    /// Active transactions without a category, newest first
    pub fn uncategorized(&self) -> DashboardResult<Vec<Transaction>> {
        let mut txns: Vec<_> = self
            .storage
            .transactions
            .get_active()?
            .into_iter()
            .filter(|t| t.category.is_none())
            .collect();
        txns.reverse();
        Ok(txns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use crate::models::{CategorySource, Money};
    use crate::storage::init::{default_categories, default_rules};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        for category in default_categories() {
            storage.categories.upsert(category).unwrap();
        }
        (temp_dir, storage)
    }

    fn add_txn(storage: &Storage, description: &str, cents: i64) -> Transaction {
        let txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            description,
            Money::from_cents(cents),
        );
        storage.transactions.insert(txn.clone()).unwrap();
        txn
    }

    #[test]
    fn test_add_rule_validates_path_and_duplicates() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let rule = service.add_rule("SASOL", "Motors/Fuel", Some("Dad")).unwrap();
        assert_eq!(rule.category, "Motors/Fuel");

        assert!(service
            .add_rule("sasol", "motors/fuel", None)
            .unwrap_err()
            .to_string()
            .contains("already exists"));
        assert!(service
            .add_rule("ENGEN", "motors/jet_fuel", None)
            .unwrap_err()
            .is_not_found());
        assert!(service.add_rule("  ", "motors", None).unwrap_err().is_validation());
    }

    #[test]
    fn test_rules_by_priority() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        service.add_rule("SPAR", "groceries", None).unwrap();
        service.add_rule("WOOLWORTHS FOOD", "groceries", None).unwrap();
        service.add_rule("MTN", "data_communication", None).unwrap();

        let order: Vec<_> = service
            .rules_by_priority()
            .unwrap()
            .into_iter()
            .map(|r| r.pattern)
            .collect();
        assert_eq!(order, vec!["WOOLWORTHS FOOD", "SPAR", "MTN"]);
    }

    #[test]
    fn test_update_and_remove_rule() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let rule = service.add_rule("CLICKS", "health", None).unwrap();

        let updated = service
            .update_rule(
                &rule.id.short(),
                RuleUpdate {
                    category: Some("health/pharmacy".into()),
                    entity: Some(Some("Mom".into())),
                    ..RuleUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.category, "health/pharmacy");
        assert_eq!(updated.entity.as_deref(), Some("Mom"));

        service.remove_rule("clicks").unwrap();
        assert!(service.list_rules().unwrap().is_empty());
    }

    #[test]
    fn test_recategorize_preserves_manual_overrides() {
        let (_temp_dir, storage) = create_test_storage();
        for rule in default_rules() {
            storage.rules.push(rule).unwrap();
        }
        let service = CategoryService::new(&storage);

        let fuel = add_txn(&storage, "SASOL RIVONIA", -60000);
        let manual = add_txn(&storage, "ENGEN QUICKSHOP", -3500);
        let unknown = add_txn(&storage, "MYSTERY SHOP", -100);

        service
            .set_manual_category(&manual.id.short(), Some("groceries"), Some("Mom"))
            .unwrap();

        let summary = service.recategorize_all().unwrap();
        assert_eq!(summary.examined, 3);
        assert_eq!(summary.manual_skipped, 1);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.uncategorized, 1);

        let fuel = storage.transactions.get(fuel.id).unwrap().unwrap();
        assert_eq!(fuel.category.as_deref(), Some("motors/fuel"));
        assert_eq!(fuel.entity.as_deref(), Some("Dad"));

        let manual = storage.transactions.get(manual.id).unwrap().unwrap();
        assert_eq!(manual.category.as_deref(), Some("groceries"));
        assert_eq!(manual.category_source, CategorySource::Manual);

        let unknown = storage.transactions.get(unknown.id).unwrap().unwrap();
        assert!(unknown.category.is_none());
    }

    #[test]
    fn test_clear_override_reapplies_rules() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        service.add_rule("NETFLIX", "entertainment/streaming", None).unwrap();
        let txn = add_txn(&storage, "NETFLIX.COM", -19900);

        service
            .set_manual_category(&txn.id.short(), Some("other"), None)
            .unwrap();
        let cleared = service.clear_override(&txn.id.short()).unwrap();

        assert_eq!(cleared.category.as_deref(), Some("entertainment/streaming"));
        assert_eq!(cleared.category_source, CategorySource::Auto);
    }

    #[test]
    fn test_exclude_and_restore() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let txn = add_txn(&storage, "REFUNDED ORDER", -5000);

        service.exclude_transaction(&txn.id.short()).unwrap();
        assert!(storage.transactions.get_active().unwrap().is_empty());
        assert_eq!(storage.transactions.count().unwrap(), 1);

        service.restore_transaction(&txn.id.short()).unwrap();
        assert_eq!(storage.transactions.get_active().unwrap().len(), 1);
    }

    #[test]
    fn test_category_and_label_management() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        service.create_category("Pets", "Animals").unwrap();
        assert!(service.create_category("pets", "").is_err());

        service.add_label("pets", "Vet", "Vet bills").unwrap();
        assert!(service.validate_path("pets/vet").is_ok());

        service.add_rule("VET CLINIC", "pets/vet", None).unwrap();
        assert!(service.remove_label("pets", "vet", false).is_err());
        service.remove_label("pets", "vet", true).unwrap();

        assert!(service.delete_category("pets", false).is_err());
        service.delete_category("pets", true).unwrap();
        assert!(service.get_category("pets").unwrap_err().is_not_found());
    }

    #[test]
    fn test_inactive_label_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        service.set_label_active("motors", "fuel", false).unwrap();
        assert!(service.validate_path("motors/fuel").unwrap_err().is_validation());
        assert!(service.validate_path("motors/maintenance").is_ok());
    }
}
