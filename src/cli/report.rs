//! Reports menu

use std::fs::File;
use std::io::BufWriter;

use crate::error::{DashboardError, DashboardResult};
use crate::models::Period;
use crate::reports::{BudgetReport, CategoryBreakdown, EntityReport, MonthlySummary};

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("Monthly summary", monthly_summary),
    ("Category breakdown", category_breakdown),
    ("Spending by entity", entity_report),
    ("Budget vs actual", budget_report),
    ("Export category breakdown to CSV", export_breakdown),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Reports", ITEMS)
}

fn ask_period(session: &mut Session) -> DashboardResult<Period> {
    session
        .console
        .ask_period("Period (YYYY-MM, YYYY, TY2025 or from..to)", Period::current_month())
}

fn monthly_summary(session: &mut Session) -> DashboardResult<()> {
    let period = ask_period(session)?;
    let report = MonthlySummary::generate(&session.storage, &period, session.settings.reports.top_n)?;
    session.console.write(&report.format_terminal())
}

fn category_breakdown(session: &mut Session) -> DashboardResult<()> {
    let period = ask_period(session)?;
    let report = CategoryBreakdown::generate(&session.storage, &period)?;
    session.console.write(&report.format_terminal())
}

fn entity_report(session: &mut Session) -> DashboardResult<()> {
    let period = ask_period(session)?;
    let report = EntityReport::generate(&session.storage, &period)?;
    session.console.write(&report.format_terminal())
}

fn budget_report(session: &mut Session) -> DashboardResult<()> {
    let period = ask_period(session)?;
    let report = BudgetReport::generate(&session.storage, &period, &session.settings.budget)?;
    session.console.write(&report.format_terminal())
}

fn export_breakdown(session: &mut Session) -> DashboardResult<()> {
    let period = ask_period(session)?;
    let report = CategoryBreakdown::generate(&session.storage, &period)?;

    let dir = session.storage.paths().export_dir();
    std::fs::create_dir_all(&dir)?;
    let file_name = format!("breakdown-{}.csv", period.to_string().replace("..", "_"));
    let path = dir.join(file_name);
    let file = File::create(&path)
        .map_err(|e| DashboardError::Export(format!("Cannot create '{}': {}", path.display(), e)))?;
    report.export_csv(BufWriter::new(file))?;

    session
        .console
        .say(format!("Wrote {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::session;
    use crate::models::{Money, Transaction};
    use chrono::NaiveDate;

    fn seed(session: &Session) {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(),
            "SASOL FUEL STATION",
            Money::from_cents(-45_000),
        );
        txn.apply_auto(Some("motors/fuel".into()), Some("Dad".into()));
        session.storage.transactions.insert(txn).unwrap();
    }

    #[test]
    fn test_summary_for_entered_period() {
        let (mut session, out, _dir) = session("2024-11\n");
        seed(&session);
        monthly_summary(&mut session).unwrap();
        assert!(out.text().contains("R450.00"));
    }

    #[test]
    fn test_export_breakdown_writes_file() {
        let (mut session, out, _dir) = session("2024-11\n");
        seed(&session);
        export_breakdown(&mut session).unwrap();

        let path = session.storage.paths().export_dir().join("breakdown-2024-11.csv");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("category,label,total,count,percent_of_total"));
        assert!(content.contains("motors,fuel,450.00,1,"));
        assert!(out.text().contains("Wrote "));
    }
}
