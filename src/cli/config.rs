//! Configuration menu: entities, thresholds and import preferences
//!
//! Changes are written to `config.json` as soon as they are made.

use std::path::PathBuf;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{BudgetBasis, EntityKind};
use crate::services::TaxpayerKind;

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("Show settings", show_settings),
    ("List entities", list_entities),
    ("Add entity", add_entity),
    ("Remove entity", remove_entity),
    ("Budget thresholds", set_thresholds),
    ("Budget basis (expenses only / net)", toggle_basis),
    ("Default bank profile", set_default_profile),
    ("Toggle auto-categorize on import", toggle_auto_categorize),
    ("Toggle duplicate detection on import", toggle_duplicate_detection),
    ("Top categories in summaries", set_top_n),
    ("Backups to keep", set_backup_retention),
    ("Reset to defaults", reset_settings),
    ("Export settings", export_settings),
    ("Import settings", import_settings),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Configuration", ITEMS)
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn show_settings(session: &mut Session) -> DashboardResult<()> {
    let s = &session.settings;
    let lines = [
        format!("Workspace:             {}", session.storage.paths().base_dir().display()),
        format!("Date format:           {}", s.date_format),
        format!("Default bank profile:  {}", s.import.default_profile),
        format!("Auto-categorize:       {}", on_off(s.import.auto_categorize)),
        format!("Duplicate detection:   {}", on_off(s.import.duplicate_detection)),
        format!("Budget basis:          {}", s.budget.basis),
        format!(
            "Budget thresholds:     warning {:.0}%, critical {:.0}%",
            s.budget.warning_threshold * 100.0,
            s.budget.critical_threshold * 100.0
        ),
        format!("Top categories:        {}", s.reports.top_n),
        format!("Backups kept:          {}", s.backup_retention.keep),
        format!("Entities:              {}", s.entities.len()),
        format!("Tax deduction rules:   {}", s.tax.deductions.len()),
    ];
    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}

fn list_entities(session: &mut Session) -> DashboardResult<()> {
    let lines: Vec<String> = session
        .settings
        .entities
        .iter()
        .map(|e| {
            format!(
                "  {:<16} {:<10} taxed as {}",
                e.name,
                e.kind.to_string(),
                TaxpayerKind::for_entity(e.kind)
            )
        })
        .collect();
    if lines.is_empty() {
        return session.console.say("No entities defined.");
    }
    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}

fn add_entity(session: &mut Session) -> DashboardResult<()> {
    let name = session.console.ask_required("Entity name: ")?;
    let kinds: Vec<String> = EntityKind::all().iter().map(|k| k.to_string()).collect();
    let chosen = session.console.choose("Kind", &kinds)?.to_string();
    let kind = EntityKind::parse(&chosen)
        .ok_or_else(|| DashboardError::Validation(format!("Unknown entity kind: {}", chosen)))?;

    session.settings.add_entity(&name, kind)?;
    session.save_settings()?;
    session
        .console
        .say(format!("Added entity {} ({})", name.trim(), kind))
}

fn remove_entity(session: &mut Session) -> DashboardResult<()> {
    let name = session.console.ask_required("Entity name: ")?;
    let removed = session.settings.remove_entity(&name)?;
    session.save_settings()?;
    session.console.say(format!(
        "Removed entity {}. Existing transactions keep their entity name.",
        removed.name
    ))
}

fn set_thresholds(session: &mut Session) -> DashboardResult<()> {
    let warning: f64 = session.console.ask_parsed(
        "Warning at % of target",
        Some(session.settings.budget.warning_threshold * 100.0),
    )?;
    let critical: f64 = session.console.ask_parsed(
        "Over budget above % of target",
        Some(session.settings.budget.critical_threshold * 100.0),
    )?;

    session.settings.set_thresholds(warning / 100.0, critical / 100.0)?;
    session.save_settings()?;
    session.console.say(format!(
        "Thresholds set to {:.0}% / {:.0}%",
        warning, critical
    ))
}

fn toggle_basis(session: &mut Session) -> DashboardResult<()> {
    let basis = match session.settings.budget.basis {
        BudgetBasis::ExpensesOnly => BudgetBasis::Net,
        BudgetBasis::Net => BudgetBasis::ExpensesOnly,
    };
    session.settings.budget.basis = basis;
    session.save_settings()?;
    session.console.say(format!("Budget basis is now {}", basis))
}

fn set_default_profile(session: &mut Session) -> DashboardResult<()> {
    let names: Vec<String> = session.settings.import.profiles.keys().cloned().collect();
    let chosen = session.console.choose("Profile", &names)?.to_string();
    session.settings.import.default_profile = chosen.clone();
    session.save_settings()?;
    session
        .console
        .say(format!("Default bank profile is now {}", chosen))
}

fn toggle_auto_categorize(session: &mut Session) -> DashboardResult<()> {
    let value = !session.settings.import.auto_categorize;
    session.settings.import.auto_categorize = value;
    session.save_settings()?;
    session
        .console
        .say(format!("Auto-categorize on import is {}", on_off(value)))
}

fn toggle_duplicate_detection(session: &mut Session) -> DashboardResult<()> {
    let value = !session.settings.import.duplicate_detection;
    session.settings.import.duplicate_detection = value;
    session.save_settings()?;
    session
        .console
        .say(format!("Duplicate detection on import is {}", on_off(value)))
}

fn set_top_n(session: &mut Session) -> DashboardResult<()> {
    let top_n: usize = session
        .console
        .ask_parsed("Categories to show", Some(session.settings.reports.top_n))?;
    if top_n == 0 {
        return Err(DashboardError::Validation("Show at least one category".into()));
    }
    session.settings.reports.top_n = top_n;
    session.save_settings()?;
    session.console.say(format!("Summaries show the top {}", top_n))
}

fn set_backup_retention(session: &mut Session) -> DashboardResult<()> {
    let keep: usize = session
        .console
        .ask_parsed("Backups to keep", Some(session.settings.backup_retention.keep))?;
    if keep == 0 {
        return Err(DashboardError::Validation("Keep at least one backup".into()));
    }
    session.settings.backup_retention.keep = keep;
    session.save_settings()?;
    session.console.say(format!("Keeping the newest {} backups", keep))
}

fn reset_settings(session: &mut Session) -> DashboardResult<()> {
    if !session
        .console
        .confirm("Reset every setting, including entities, to defaults?")?
    {
        return session.console.say("Settings unchanged.");
    }
    session.settings.reset_to_defaults();
    session.save_settings()?;
    session.console.say("Settings reset to defaults.")
}

fn export_settings(session: &mut Session) -> DashboardResult<()> {
    let default_path = session
        .storage
        .paths()
        .export_dir()
        .join(format!("settings-{}.json", chrono::Local::now().format("%Y%m%d-%H%M%S")));
    let path = session
        .console
        .ask_with_default("Export to", &default_path.display().to_string())?;
    let path = PathBuf::from(path);

    session.storage.paths().ensure_directories()?;
    session.settings.export_to(&path)?;
    session
        .console
        .say(format!("Settings exported to {}", path.display()))
}

fn import_settings(session: &mut Session) -> DashboardResult<()> {
    let path = PathBuf::from(session.console.ask_required("Settings file: ")?);
    let replace = session
        .console
        .confirm("Replace all settings instead of merging?")?;

    let imported = session.settings.import_from(&path, !replace)?;
    session.settings = imported;
    session.save_settings()?;
    session.console.say(format!(
        "Settings {} from {}",
        if replace { "replaced" } else { "merged" },
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;
    use crate::cli::testing::session;

    #[test]
    fn test_add_entity_is_persisted() {
        let (mut session, out, _dir) = session("Gran\n1\n");
        add_entity(&mut session).unwrap();
        assert!(out.text().contains("Added entity Gran (person)"));

        let reloaded = Settings::load_or_create(session.storage.paths()).unwrap();
        assert!(reloaded.entity("gran").is_some());
    }

    #[test]
    fn test_bad_thresholds_rejected() {
        let (mut session, _, _dir) = session("120\n90\n");
        let err = set_thresholds(&mut session).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.settings.budget.warning_threshold, 0.8);
    }

    #[test]
    fn test_toggle_auto_categorize() {
        let (mut session, out, _dir) = session("");
        toggle_auto_categorize(&mut session).unwrap();
        assert!(!session.settings.import.auto_categorize);
        assert!(out.text().contains("is off"));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (mut session, out, _dir) = session("y\n");
        session.settings.reports.top_n = 9;
        session.settings.entities.clear();
        reset_settings(&mut session).unwrap();

        assert_eq!(session.settings.reports.top_n, 5);
        assert_eq!(session.settings.entities.len(), 5);
        let reloaded = Settings::load_or_create(session.storage.paths()).unwrap();
        assert_eq!(reloaded.reports.top_n, 5);
        assert!(out.text().contains("reset to defaults"));
    }

    #[test]
    fn test_export_then_merge_import() {
        let (mut session, _, dir) = session("");
        let exported = dir.path().join("mine.json");
        let partial = dir.path().join("partial.json");
        std::fs::write(&partial, r#"{"reports": {"top_n": 8}}"#).unwrap();

        let script = format!(
            "{}\n{}\nn\n",
            exported.display(),
            partial.display()
        );
        let (console, out) = crate::cli::testing::console(&script);
        session.console = console;
        session.settings.import.auto_categorize = false;

        export_settings(&mut session).unwrap();
        assert!(exported.exists());

        import_settings(&mut session).unwrap();
        assert_eq!(session.settings.reports.top_n, 8);
        // Merge keeps keys the file does not name
        assert!(!session.settings.import.auto_categorize);
        assert!(out.text().contains("Settings merged from"));

        let reloaded = Settings::load_or_create(session.storage.paths()).unwrap();
        assert_eq!(reloaded.reports.top_n, 8);
    }

    #[test]
    fn test_import_invalid_file_leaves_settings() {
        let (mut session, _, dir) = session("");
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2]").unwrap();
        let (console, _) = crate::cli::testing::console(&format!("{}\ny\n", bad.display()));
        session.console = console;

        assert!(import_settings(&mut session).is_err());
        assert_eq!(session.settings.reports.top_n, 5);
    }

    #[test]
    fn test_list_entities_shows_tax_kind() {
        let (mut session, out, _dir) = session("");
        list_entities(&mut session).unwrap();
        assert!(out.text().contains("taxed as small business"));
    }
}
