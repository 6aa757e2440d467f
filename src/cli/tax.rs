//! Tax menu: indicative SA tax estimates

use crate::error::DashboardResult;
use crate::models::{Money, Period};
use crate::reports::{format_optional_percent, TaxReport};
use crate::services::tax::{compute_tax, TaxTable};
use crate::services::TaxpayerKind;

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("Tax year report per entity", tax_year_report),
    ("Quick estimate for an income", quick_estimate),
    ("Show tax tables", show_tables),
];

const KINDS: [TaxpayerKind; 3] = [
    TaxpayerKind::Individual,
    TaxpayerKind::SmallBusiness,
    TaxpayerKind::Company,
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Tax", ITEMS)
}

fn tax_year_report(session: &mut Session) -> DashboardResult<()> {
    let period = session
        .console
        .ask_period("Tax year (e.g. TY2025)", Period::current_tax_year())?;
    let report = TaxReport::generate(&session.storage, &period, &session.settings)?;
    session.console.write(&report.format_terminal())
}

fn ask_kind(session: &mut Session) -> DashboardResult<TaxpayerKind> {
    let names: Vec<String> = KINDS.iter().map(|k| k.to_string()).collect();
    let chosen = session.console.choose("Taxpayer", &names)?.to_string();
    Ok(KINDS
        .iter()
        .copied()
        .find(|k| k.to_string() == chosen)
        .unwrap_or(TaxpayerKind::Individual))
}

fn quick_estimate(session: &mut Session) -> DashboardResult<()> {
    let kind = ask_kind(session)?;
    let income = session.console.ask_money("Annual taxable income")?;
    let rebate = match kind {
        TaxpayerKind::Individual => session.settings.tax.primary_rebate,
        _ => Money::zero(),
    };
    let result = compute_tax(&TaxTable::for_kind(kind), income, Money::zero(), rebate);

    let lines = [
        format!("Taxable income:   {}", result.taxable_income),
        format!("Tax per tables:   {}", result.bracket_liability),
        format!("Rebate:           {}", result.rebate),
        format!("Estimated tax:    {}", result.net_liability),
        format!(
            "Effective rate:   {}",
            format_optional_percent(result.effective_rate().map(|r| r * 100.0))
        ),
        format!(
            "Marginal rate:    {:.0}%",
            result.marginal_rate_bps as f64 / 100.0
        ),
    ];
    for line in lines {
        session.console.say(line)?;
    }
    Ok(())
}

fn show_tables(session: &mut Session) -> DashboardResult<()> {
    for kind in KINDS {
        session.console.say(format!("{}:", kind))?;
        for bracket in TaxTable::for_kind(kind).brackets() {
            session.console.say(format!(
                "  above {:>14}  {:>5.1}%",
                bracket.lower.to_string(),
                bracket.rate_bps as f64 / 100.0
            ))?;
        }
    }
    session.console.say(format!(
        "Primary rebate (individuals): {}",
        session.settings.tax.primary_rebate
    ))
}
