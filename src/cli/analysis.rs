//! Analysis menu: trends and a financial health check

use crate::display::report::{colorize_signed, format_bar, format_header, separator};
use crate::error::DashboardResult;
use crate::models::Period;
use crate::reports::format_optional_percent;
use crate::services::AnalysisService;

use super::{submenu, Handler, Session};

const WIDTH: usize = 74;

fn heading(title: &str) -> String {
    format!("{}\n{}\n", format_header(title, WIDTH), separator(WIDTH))
}

const ITEMS: &[(&str, Handler)] = &[
    ("Income vs expenses", income_vs_expenses),
    ("Spending patterns", spending_patterns),
    ("Category growth", category_growth),
    ("Budget performance", budget_performance),
    ("Financial health", financial_health),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Analysis", ITEMS)
}

fn ask_window(session: &mut Session) -> DashboardResult<(Period, usize)> {
    let end = session
        .console
        .ask_period("Last month of the window", Period::current_month())?;
    let months = session.console.ask_parsed("Number of months", Some(6usize))?;
    Ok((end, months.max(1)))
}

fn income_vs_expenses(session: &mut Session) -> DashboardResult<()> {
    let (end, months) = ask_window(session)?;
    let flows = AnalysisService::new(&session.storage).income_vs_expenses(&end, months)?;
    let currencies = session.storage.currencies.get()?;

    let mut output = heading("Income vs Expenses");
    output.push_str(&format!(
        "{:<10}{:>16}{:>16}{:>10}  {}\n",
        "Month", "Income", "Expenses", "Saved", "Net"
    ));
    for flow in &flows {
        // Net goes last so colour codes don't shift the columns
        output.push_str(&format!(
            "{:<10}{:>16}{:>16}{:>10}  {}\n",
            flow.period.to_string(),
            currencies.format_default(flow.income),
            currencies.format_default(flow.expenses),
            format_optional_percent(flow.savings_rate),
            colorize_signed(&currencies.format_default(flow.net), flow.net)
        ));
    }
    session.console.write(&output)
}

fn spending_patterns(session: &mut Session) -> DashboardResult<()> {
    let (end, months) = ask_window(session)?;
    let patterns = AnalysisService::new(&session.storage).spending_patterns(&end, months)?;
    let currencies = session.storage.currencies.get()?;

    let mut output = heading(&format!("Spending Patterns ({} months to {})", months, end));
    if patterns.is_empty() {
        output.push_str("No spending in this window.\n");
    }
    for p in &patterns {
        output.push_str(&format!(
            "{:<22}{:>16} avg {:>14}/month  {:>5.1}% {} ({} of {} months)\n",
            p.category,
            currencies.format_default(p.total),
            currencies.format_default(p.monthly_average),
            p.share,
            format_bar(p.share, 100.0, 20),
            p.active_months,
            months
        ));
    }
    session.console.write(&output)
}

fn category_growth(session: &mut Session) -> DashboardResult<()> {
    let period = session.console.ask_period("Period", Period::current_month())?;
    let trends = AnalysisService::new(&session.storage).category_growth(&period)?;
    let currencies = session.storage.currencies.get()?;

    let mut output = heading(&format!("Category Growth, {} vs {}", period, period.prev()));
    if trends.is_empty() {
        output.push_str("No spending in either period.\n");
    }
    for t in &trends {
        // More spending shows red
        output.push_str(&format!(
            "{:<22}{:>16}{:>16}{:>10}  {}\n",
            t.category,
            currencies.format_default(t.previous),
            currencies.format_default(t.current),
            format_optional_percent(t.change_percent),
            colorize_signed(&currencies.format_default(t.change), -t.change)
        ));
    }
    session.console.write(&output)
}

fn budget_performance(session: &mut Session) -> DashboardResult<()> {
    let period = session.console.ask_period("Period", Period::current_month())?;
    let perf = AnalysisService::new(&session.storage).budget_performance(&period, &session.settings.budget)?;
    let currencies = session.storage.currencies.get()?;

    let lines = [
        format!("Budgets in {}: {}", perf.period, perf.budgets),
        format!(
            "On track {}, near limit {}, over {}, no target {}",
            perf.on_track, perf.warning, perf.over, perf.no_target
        ),
        format!(
            "Spent {} of {} ({})",
            currencies.format_default(perf.total_actual),
            currencies.format_default(perf.total_target),
            format_optional_percent(perf.utilization)
        ),
        format!("Adherence: {}", format_optional_percent(perf.adherence())),
    ];
    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}

fn financial_health(session: &mut Session) -> DashboardResult<()> {
    let (end, months) = ask_window(session)?;
    let health = AnalysisService::new(&session.storage).financial_health(&end, months, &session.settings.budget)?;

    let lines = [
        format!("Health score: {}/100 ({})", health.score, health.grade),
        format!("  Savings rate:       {}", format_optional_percent(health.savings_rate)),
        format!("  Expense ratio:      {}", format_optional_percent(health.expense_ratio)),
        format!("  Positive months:    {:.0}%", health.positive_months),
        format!(
            "  Categorized:        {}",
            format_optional_percent(health.categorized_share)
        ),
        format!(
            "  Budget adherence:   {}",
            format_optional_percent(health.budget_adherence)
        ),
    ];
    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}
