//! Budgets menu

use crate::display::budget_table;
use crate::error::{DashboardError, DashboardResult};
use crate::models::Period;
use crate::reports::BudgetReport;
use crate::services::BudgetService;

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("List budgets", list_budgets),
    ("Create budget", create_budget),
    ("Change a budget target", set_target),
    ("Delete budget", delete_budget),
    ("Budget vs actual for a period", evaluate_period),
    ("Copy a period's budgets to the next period", roll_forward),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Budgets", ITEMS)
}

fn list_budgets(session: &mut Session) -> DashboardResult<()> {
    let period = match session
        .console
        .ask_optional("Period (blank for all): ")?
    {
        Some(input) => {
            Some(Period::parse(&input).map_err(|e| DashboardError::Validation(e.to_string()))?)
        }
        None => None,
    };

    let budgets = BudgetService::new(&session.storage).list_budgets(period.as_ref())?;
    let currencies = session.storage.currencies.get()?;
    session.console.write(&budget_table(&budgets, &currencies))
}

fn create_budget(session: &mut Session) -> DashboardResult<()> {
    let entities: Vec<String> = session.settings.entities.iter().map(|e| e.name.clone()).collect();
    let entity = session.console.choose("Entity", &entities)?.to_string();
    let category = session
        .console
        .ask_optional("Category (blank for all spending): ")?;
    let period = session.console.ask_period("Period", Period::current_month())?;
    let target = session.console.ask_money("Target amount")?;

    let budget = BudgetService::new(&session.storage).create_budget(
        &entity,
        category.as_deref(),
        period,
        target,
    )?;
    let currencies = session.storage.currencies.get()?;
    session.console.say(format!(
        "Created budget {} for {}: {}",
        budget.id.short(),
        budget.scope(),
        currencies.format(budget.target, &budget.currency)
    ))
}

fn set_target(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Budget ID: ")?;
    let target = session.console.ask_money("New target amount")?;
    let budget = BudgetService::new(&session.storage).set_target(&input, target)?;
    let currencies = session.storage.currencies.get()?;
    session.console.say(format!(
        "{} target is now {}",
        budget.scope(),
        currencies.format(budget.target, &budget.currency)
    ))
}

fn delete_budget(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Budget ID: ")?;
    let removed = BudgetService::new(&session.storage).delete_budget(&input)?;
    session
        .console
        .say(format!("Deleted budget for {}", removed.scope()))
}

fn evaluate_period(session: &mut Session) -> DashboardResult<()> {
    let period = session.console.ask_period("Period", Period::current_month())?;
    let report = BudgetReport::generate(&session.storage, &period, &session.settings.budget)?;
    session.console.write(&report.format_terminal())
}

fn roll_forward(session: &mut Session) -> DashboardResult<()> {
    let from = session
        .console
        .ask_period("Copy budgets from", Period::current_month())?;
    let created = BudgetService::new(&session.storage).roll_forward(&from)?;
    session.console.say(format!(
        "Created {} budgets in {}",
        created,
        from.next()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::session;

    #[test]
    fn test_create_and_roll_forward() {
        let (mut session, out, _dir) = session("1\nmotors\n2025-01\n1500\n2025-01\n");
        create_budget(&mut session).unwrap();
        roll_forward(&mut session).unwrap();

        let budgets = BudgetService::new(&session.storage).list_budgets(None).unwrap();
        assert_eq!(budgets.len(), 2);
        let text = out.text();
        assert!(text.contains("R1,500.00"));
        assert!(text.contains("Created 1 budgets in 2025-02"));
    }

    #[test]
    fn test_invalid_period_filter() {
        let (mut session, _, _dir) = session("someday\n");
        let err = list_budgets(&mut session).unwrap_err();
        assert!(err.is_validation());
    }
}
