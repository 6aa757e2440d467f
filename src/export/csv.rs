//! Transactions CSV export

use std::io::Write;

use crate::error::{DashboardError, DashboardResult};
use crate::storage::Storage;

const HEADER: [&str; 11] = [
    "id",
    "date",
    "description",
    "amount",
    "currency",
    "category",
    "entity",
    "category_source",
    "status",
    "source_file",
    "import_id",
];

/// Write every transaction, excluded ones included, ordered by date
pub fn export_transactions_csv<W: Write>(storage: &Storage, writer: W) -> DashboardResult<usize> {
    let export_err = |e: csv::Error| DashboardError::Export(e.to_string());
    let mut transactions = storage.transactions.get_all()?;
    transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(export_err)?;

    for txn in &transactions {
        csv_writer
            .write_record([
                txn.id.to_string(),
                txn.date.to_string(),
                txn.description.clone(),
                txn.amount.to_plain_string(),
                txn.currency.clone(),
                txn.category.clone().unwrap_or_default(),
                txn.entity.clone().unwrap_or_default(),
                txn.category_source.to_string(),
                txn.status.to_string(),
                txn.source_file.clone(),
                txn.import_id.clone().unwrap_or_default(),
            ])
            .map_err(export_err)?;
    }

    csv_writer
        .flush()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    Ok(transactions.len())
}
