//! Import menu: bank statement CSVs into the ledger

use std::path::PathBuf;

use crate::display::{import_preview_table, transaction_table};
use crate::error::{DashboardError, DashboardResult};
use crate::services::import::{ImportStatus, ParsedStatement};
use crate::services::{BankProfile, ImportOptions, ImportService};

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("Import a statement", import_statement),
    ("Preview a statement", preview_statement),
    ("List bank profiles", list_profiles),
    ("Show recent transactions", recent_transactions),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Import bank statement", ITEMS)
}

/// Ask for a file, a profile and a currency, then parse the file
fn load_statement(session: &mut Session) -> DashboardResult<(PathBuf, ParsedStatement, ImportOptions)> {
    let path = PathBuf::from(session.console.ask_required("CSV file path: ")?);
    if !path.is_file() {
        return Err(DashboardError::Import(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let default_profile = session.settings.import.default_profile.clone();
    let profile_name = session
        .console
        .ask_with_default("Bank profile", &default_profile)?;
    let profile: BankProfile = session
        .settings
        .import
        .profile(Some(&profile_name))
        .map_err(|_| {
            let names: Vec<&str> = session.settings.import.profiles.keys().map(String::as_str).collect();
            DashboardError::Import(format!(
                "Unknown bank profile '{}'. Available: {}",
                profile_name,
                names.join(", ")
            ))
        })?;

    let default_currency = session.storage.currencies.get()?.default_code;
    let currency = session
        .console
        .ask_with_default("Statement currency", &default_currency)?;
    let options = ImportOptions::from_settings(&session.settings.import, &currency);
    if session.storage.currencies.get()?.get(&options.currency).is_none() {
        return Err(DashboardError::currency_not_found(options.currency));
    }

    let statement = ImportService::new(&session.storage).parse_file(&path, &profile)?;
    Ok((path, statement, options))
}

fn show_preview(
    session: &mut Session,
    statement: &ParsedStatement,
    options: &ImportOptions,
) -> DashboardResult<usize> {
    let entries = ImportService::new(&session.storage).preview(statement, options)?;
    let currencies = session.storage.currencies.get()?;
    let new_count = entries
        .iter()
        .filter(|e| e.status == ImportStatus::New)
        .count();

    session.console.write(&import_preview_table(
        &entries,
        &currencies,
        &options.currency,
    ))?;
    session.console.say(format!("  New rows:        {}", new_count))?;
    session
        .console
        .say(format!("  Duplicates:      {}", entries.len() - new_count))?;
    session
        .console
        .say(format!("  Skipped rows:    {}", statement.skipped.len()))?;
    for skipped in &statement.skipped {
        session
            .console
            .say(format!("    line {}: {}", skipped.line, skipped.reason))?;
    }
    Ok(new_count)
}

fn import_statement(session: &mut Session) -> DashboardResult<()> {
    let (path, statement, options) = load_statement(session)?;
    let new_count = show_preview(session, &statement, &options)?;
    if new_count == 0 {
        session.console.say("No new transactions to import.")?;
        return Ok(());
    }

    if !session
        .console
        .confirm(&format!("Import {} new transactions?", new_count))?
    {
        session.console.say("Import cancelled.")?;
        return Ok(());
    }

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let result = ImportService::new(&session.storage).import_statement(&statement, &source, &options)?;

    session.console.say(format!(
        "Imported {} transactions ({} categorized, {} duplicates skipped, {} rows skipped)",
        result.imported,
        result.categorized,
        result.duplicates_skipped,
        result.errors()
    ))?;
    Ok(())
}

fn preview_statement(session: &mut Session) -> DashboardResult<()> {
    let (_, statement, options) = load_statement(session)?;
    show_preview(session, &statement, &options)?;
    Ok(())
}

fn list_profiles(session: &mut Session) -> DashboardResult<()> {
    let default = session.settings.import.default_profile.clone();
    let lines: Vec<String> = session
        .settings
        .import
        .profiles
        .iter()
        .map(|(name, p)| {
            let amounts = match (p.amount_column, p.debit_column, p.credit_column) {
                (Some(a), _, _) => format!("amount col {}", a + 1),
                (None, Some(d), Some(c)) => format!("debit col {}, credit col {}", d + 1, c + 1),
                _ => "no amount column".to_string(),
            };
            format!(
                "{}{}: date col {} ({}), description col {}, {}, delimiter '{}'",
                name,
                if *name == default { " (default)" } else { "" },
                p.date_column + 1,
                p.date_format,
                p.description_column + 1,
                amounts,
                p.delimiter
            )
        })
        .collect();

    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}

fn recent_transactions(session: &mut Session) -> DashboardResult<()> {
    let limit = session.console.ask_parsed("How many", Some(20usize))?;
    let mut transactions = session.storage.transactions.get_all()?;
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    transactions.truncate(limit);

    let currencies = session.storage.currencies.get()?;
    session
        .console
        .write(&transaction_table(&transactions, &currencies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::{console, session};
    use std::fs;

    #[test]
    fn test_import_then_reimport() {
        let (mut session, _, dir) = session("");
        let csv = dir.path().join("statement.csv");
        fs::write(
            &csv,
            "Date,Description,Amount\n2024-11-03,SASOL FUEL STATION,-450.00\nbad,row,x\n",
        )
        .unwrap();

        let script = format!("{p}\n\n\ny\n{p}\n\n\n", p = csv.display());
        let (console, out) = console(&script);
        session.console = console;

        import_statement(&mut session).unwrap();
        assert_eq!(session.storage.transactions.count().unwrap(), 1);

        // Second run finds only duplicates and asks nothing
        import_statement(&mut session).unwrap();
        assert_eq!(session.storage.transactions.count().unwrap(), 1);

        let text = out.text();
        assert!(text.contains("line 3"));
        assert!(text.contains("Imported 1 transactions (1 categorized"));
        assert!(text.contains("No new transactions to import."));
    }

    #[test]
    fn test_missing_file() {
        let (mut session, _, _dir) = session("/no/such/file.csv\n");
        let err = import_statement(&mut session).unwrap_err();
        assert!(matches!(err, DashboardError::Import(_)));
    }

    #[test]
    fn test_list_profiles() {
        let (mut session, out, _dir) = session("");
        list_profiles(&mut session).unwrap();
        let text = out.text();
        assert!(text.contains("generic (default)"));
        assert!(text.contains("standard_bank"));
        assert!(text.contains("debit col 3, credit col 4"));
    }
}
