//! Workspace menu: statistics, backups, restore, cleanup and exports

use crate::backup::{BackupManager, RestoreManager};
use crate::error::DashboardResult;
use crate::export::{export_to_file, ExportFormat};
use crate::services::WorkspaceService;

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("Workspace info", info),
    ("Check workspace files", check_files),
    ("Create backup", create_backup),
    ("List backups", list_backups),
    ("Restore a backup", restore_backup),
    ("Clean up temporary files and old backups", clean),
    ("Export data", export),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Workspace", ITEMS)
}

fn backup_manager(session: &Session) -> BackupManager {
    BackupManager::new(
        session.storage.paths().clone(),
        session.settings.backup_retention.clone(),
    )
}

fn info(session: &mut Session) -> DashboardResult<()> {
    let info = WorkspaceService::new(&session.storage).info(&session.settings.backup_retention)?;
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into())
    };

    let lines = [
        format!("Workspace:      {}", info.path.display()),
        format!(
            "Transactions:   {} ({} excluded, {} uncategorized, {} manual)",
            info.transaction_count, info.excluded_count, info.uncategorized_count, info.manual_count
        ),
        format!(
            "Date range:     {} to {}",
            date(info.first_transaction),
            date(info.last_transaction)
        ),
        format!(
            "Rules:          {} ({} active)",
            info.rule_count, info.active_rule_count
        ),
        format!("Categories:     {}", info.category_count),
        format!("Budgets:        {}", info.budget_count),
        format!("Currencies:     {}", info.currency_count),
        format!(
            "Backups:        {}{}",
            info.backup_count,
            info.last_backup
                .map(|t| format!(" (last {})", t.format("%Y-%m-%d %H:%M")))
                .unwrap_or_default()
        ),
        format!("Exports:        {}", info.export_count),
        format!("Size on disk:   {:.2} MB", info.total_size_mb()),
    ];
    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}

fn check_files(session: &mut Session) -> DashboardResult<()> {
    let report = WorkspaceService::new(&session.storage).check_files();
    for (name, health) in report {
        session.console.say(format!("  {:<14} {}", name, health))?;
    }
    Ok(())
}

fn create_backup(session: &mut Session) -> DashboardResult<()> {
    let (path, removed) = backup_manager(session).create_backup_with_retention()?;
    session.console.say(format!("Backup written to {}", path.display()))?;
    if !removed.is_empty() {
        session
            .console
            .say(format!("Removed {} old backups", removed.len()))?;
    }
    Ok(())
}

fn list_backups(session: &mut Session) -> DashboardResult<()> {
    let backups = backup_manager(session).list_backups()?;
    if backups.is_empty() {
        return session.console.say("No backups found.");
    }
    for (i, backup) in backups.iter().enumerate() {
        session.console.say(format!(
            "{:>3}. {}  {}  {:.1} KB",
            i + 1,
            backup.filename,
            backup.created_at.format("%Y-%m-%d %H:%M:%S"),
            backup.size_bytes as f64 / 1024.0
        ))?;
    }
    Ok(())
}

fn restore_backup(session: &mut Session) -> DashboardResult<()> {
    list_backups(session)?;
    let input = session
        .console
        .ask_required("Backup number or file name: ")?;
    let backup = backup_manager(session).find_backup(&input)?;

    let restorer = RestoreManager::new(session.storage.paths().clone());
    let validation = restorer.validate_backup(&backup.path)?;
    session.console.say(validation.summary())?;
    if !session
        .console
        .confirm("Restore this backup over the current workspace?")?
    {
        return session.console.say("Restore cancelled.");
    }

    let result = restorer.restore_from_file(&backup.path)?;
    session.reload()?;
    session.console.say(result.summary())
}

fn clean(session: &mut Session) -> DashboardResult<()> {
    let result = WorkspaceService::new(&session.storage).clean(&session.settings.backup_retention)?;
    session.console.say(format!(
        "Removed {} files, freed {:.1} KB",
        result.removed.len(),
        result.bytes_freed as f64 / 1024.0
    ))
}

fn export(session: &mut Session) -> DashboardResult<()> {
    let formats = [
        ExportFormat::Json,
        ExportFormat::Yaml,
        ExportFormat::TransactionsCsv,
    ];
    let names: Vec<String> = vec![
        "Full export (JSON)".into(),
        "Full export (YAML)".into(),
        "Transactions (CSV)".into(),
    ];
    let chosen = session.console.choose("Format", &names)?.to_string();
    let index = names.iter().position(|n| *n == chosen).unwrap_or(0);

    let path = export_to_file(&session.storage, formats[index])?;
    session.console.say(format!("Exported to {}", path.display()))
}
