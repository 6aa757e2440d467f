//! Transaction listings and import previews

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{CategorySource, CurrencyConfig, Transaction, TransactionStatus};
use crate::services::import::{ImportPreviewEntry, ImportStatus};
use crate::services::Categorization;

use super::report::truncate;

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Entity")]
    entity: String,
}

fn category_cell(txn: &Transaction) -> String {
    let name = txn.category.as_deref().unwrap_or("-");
    let marker = match (txn.category_source, txn.status) {
        (_, TransactionStatus::Excluded) => " (excluded)",
        (CategorySource::Manual, _) => " *",
        _ => "",
    };
    format!("{}{}", name, marker)
}

/// Table of transactions; amounts shown in their own currency
///
/// A `*` after the category marks a manual override.
pub fn transaction_table(transactions: &[Transaction], currencies: &CurrencyConfig) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let rows = transactions.iter().map(|t| TransactionRow {
        id: t.id.short(),
        date: t.date.format("%Y-%m-%d").to_string(),
        description: truncate(&t.description, 36),
        amount: currencies.format(t.amount, &t.currency),
        category: category_cell(t),
        entity: t.entity.clone().unwrap_or_else(|| "-".into()),
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n", table)
}

pub fn format_transaction_details(txn: &Transaction, currencies: &CurrencyConfig) -> String {
    let mut output = String::new();
    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("Description: {}\n", txn.description));
    output.push_str(&format!(
        "Amount:      {}\n",
        currencies.format(txn.amount, &txn.currency)
    ));
    output.push_str(&format!(
        "Category:    {} ({})\n",
        txn.category.as_deref().unwrap_or("(uncategorized)"),
        txn.category_source
    ));
    output.push_str(&format!(
        "Entity:      {}\n",
        txn.entity.as_deref().unwrap_or("(none)")
    ));
    output.push_str(&format!("Status:      {}\n", txn.status));
    if !txn.source_file.is_empty() {
        output.push_str(&format!("Source:      {}\n", txn.source_file));
    }
    output
}

#[derive(Tabled)]
struct PreviewRow {
    #[tabled(rename = "Line")]
    line: u64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

/// Table of parsed rows with their duplicate status and rule match
pub fn import_preview_table(entries: &[ImportPreviewEntry], currencies: &CurrencyConfig, code: &str) -> String {
    if entries.is_empty() {
        return "No rows parsed.\n".to_string();
    }

    let rows = entries.iter().map(|e| PreviewRow {
        line: e.row.line,
        date: e.row.date.format("%Y-%m-%d").to_string(),
        description: truncate(&e.row.description, 36),
        amount: currencies.format(e.row.amount, code),
        category: match &e.categorization {
            Categorization::Matched {
                category,
                entity: Some(entity),
                ..
            } => format!("{} ({})", category, entity),
            Categorization::Matched { category, .. } => category.clone(),
            Categorization::Uncategorized => "-".to_string(),
        },
        status: match e.status {
            ImportStatus::New => "new",
            ImportStatus::Duplicate => "duplicate",
        },
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::NaiveDate;

    #[test]
    fn test_transaction_table() {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(),
            "SASOL FUEL STATION",
            Money::from_cents(-45_000),
        );
        txn.apply_manual(Some("motors/fuel".into()), Some("Dad".into()));

        let text = transaction_table(&[txn], &CurrencyConfig::default());
        assert!(text.contains("SASOL FUEL STATION"));
        assert!(text.contains("-R450.00"));
        assert!(text.contains("motors/fuel *"));
        assert!(text.contains("Dad"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            transaction_table(&[], &CurrencyConfig::default()),
            "No transactions found.\n"
        );
    }

    #[test]
    fn test_details_foreign_currency() {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            "AWS",
            Money::from_cents(-1_999),
        );
        txn.currency = "USD".into();
        let text = format_transaction_details(&txn, &CurrencyConfig::default());
        assert!(text.contains("-$19.99"));
        assert!(text.contains("(uncategorized)"));
    }
}
