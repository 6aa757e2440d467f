//! Transaction repository for JSON storage
//!
//! Manages loading and saving the ledger in transactions.json. The ledger is
//! append-only: there is no delete, only soft status changes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::DashboardError;
use crate::models::{Transaction, TransactionId};

use super::file_io::{read_json_lenient, write_json_atomic};
use super::lock_poisoned;

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct TransactionData {
    pub(crate) transactions: Vec<Transaction>,
}

#[derive(Default)]
struct Ledger {
    by_id: HashMap<TransactionId, Transaction>,
    /// Index: import fingerprint -> transaction id
    by_import_id: HashMap<String, TransactionId>,
}

impl Ledger {
    fn index(&mut self, txn: Transaction) {
        if let Some(import_id) = &txn.import_id {
            self.by_import_id.insert(import_id.clone(), txn.id);
        }
        self.by_id.insert(txn.id, txn);
    }

    fn sorted(&self) -> Vec<Transaction> {
        let mut transactions: Vec<_> = self.by_id.values().cloned().collect();
        transactions.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        transactions
    }
}

/// Repository for transaction persistence with an import-id index
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<Ledger>,
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Ledger::default()),
        }
    }

    /// Load transactions from disk and build indexes
    ///
    /// A corrupt ledger loads as empty.
    pub fn load(&self) -> Result<(), DashboardError> {
        let file_data: TransactionData = read_json_lenient(&self.path);
        let mut data = self.data.write().map_err(lock_poisoned)?;

        *data = Ledger::default();
        for txn in file_data.transactions {
            data.index(txn);
        }
        debug!(count = data.by_id.len(), "loaded transactions");
        Ok(())
    }

    /// Save transactions to disk in chronological order
    pub fn save(&self) -> Result<(), DashboardError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let file_data = TransactionData {
            transactions: data.sorted(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, DashboardError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.by_id.get(&id).cloned())
    }

    /// Get all transactions, oldest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, DashboardError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.sorted())
    }

    /// Get active transactions, oldest first
    pub fn get_active(&self) -> Result<Vec<Transaction>, DashboardError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(Transaction::is_active)
            .collect())
    }

    /// Get active transactions in an inclusive date range
    pub fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, DashboardError> {
        Ok(self
            .get_active()?
            .into_iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect())
    }

    /// Find a transaction by user input: full UUID or short id
    pub fn find(&self, input: &str) -> Result<Option<Transaction>, DashboardError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let mut matches = data.by_id.values().filter(|t| t.id.matches(input));
        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(DashboardError::Validation(format!(
                "'{}' matches more than one transaction",
                input.trim()
            )));
        }
        Ok(first)
    }

    /// Append a new transaction; an existing id is rejected
    pub fn insert(&self, txn: Transaction) -> Result<(), DashboardError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        if data.by_id.contains_key(&txn.id) {
            return Err(DashboardError::Duplicate {
                entity_type: "Transaction",
                identifier: txn.id.to_string(),
            });
        }
        data.index(txn);
        Ok(())
    }

    /// Replace an existing transaction
    pub fn update(&self, txn: Transaction) -> Result<(), DashboardError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        if !data.by_id.contains_key(&txn.id) {
            return Err(DashboardError::transaction_not_found(txn.id.to_string()));
        }
        data.index(txn);
        Ok(())
    }

    /// Check whether an import fingerprint is already stored
    pub fn contains_import_id(&self, import_id: &str) -> Result<bool, DashboardError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.by_import_id.contains_key(import_id))
    }

    /// Count transactions, including excluded ones
    pub fn count(&self) -> Result<usize, DashboardError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.by_id.len())
    }
}
