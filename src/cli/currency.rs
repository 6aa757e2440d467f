//! Currency settings menu

use crate::display::currency_table;
use crate::error::DashboardResult;
use crate::services::CurrencyService;

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("List currencies", list_currencies),
    ("Set default display currency", set_default),
    ("Update an exchange rate", update_rate),
    ("Add currency", add_currency),
    ("Remove currency", remove_currency),
    ("Convert an amount", convert),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Currency settings", ITEMS)
}

fn list_currencies(session: &mut Session) -> DashboardResult<()> {
    let config = CurrencyService::new(&session.storage).config()?;
    session.console.write(&currency_table(&config))
}

fn set_default(session: &mut Session) -> DashboardResult<()> {
    let code = session.console.ask_required("Currency code: ")?;
    let currency = CurrencyService::new(&session.storage).set_default(&code)?;
    session
        .console
        .say(format!("Default currency is now {} ({})", currency.code, currency.name))
}

fn update_rate(session: &mut Session) -> DashboardResult<()> {
    let code = session.console.ask_required("Currency code: ")?;
    let rate: f64 = session.console.ask_parsed("Value of 1 unit in ZAR", None)?;
    let currency = CurrencyService::new(&session.storage).update_rate(&code, rate)?;
    session
        .console
        .say(format!("1 {} = {:.4} ZAR", currency.code, currency.rate_to_base))
}

fn add_currency(session: &mut Session) -> DashboardResult<()> {
    let code = session.console.ask_required("Code (e.g. CHF): ")?;
    let symbol = session.console.ask_required("Symbol: ")?;
    let name = session.console.ask_required("Name: ")?;
    let rate: f64 = session.console.ask_parsed("Value of 1 unit in ZAR", None)?;
    let decimals: u8 = session.console.ask_parsed("Decimal places", Some(2))?;

    let currency = CurrencyService::new(&session.storage).add_currency(&code, &symbol, &name, rate, decimals)?;
    session
        .console
        .say(format!("Added {} ({})", currency.code, currency.name))
}

fn remove_currency(session: &mut Session) -> DashboardResult<()> {
    let code = session.console.ask_required("Currency code: ")?;
    let removed = CurrencyService::new(&session.storage).remove_currency(&code)?;
    session.console.say(format!("Removed {}", removed.code))
}

fn convert(session: &mut Session) -> DashboardResult<()> {
    let amount = session.console.ask_money("Amount")?;
    let from = session.console.ask_with_default("From", "ZAR")?;
    let to = session.console.ask_with_default("To", "USD")?;

    let service = CurrencyService::new(&session.storage);
    let converted = service.convert(amount, &from, &to)?;
    let config = service.config()?;
    session.console.say(format!(
        "{} = {}",
        config.format(amount, &from),
        config.format(converted, &to)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::session;

    #[test]
    fn test_update_rate_then_convert() {
        let (mut session, out, _dir) = session("USD\n20\n100\nUSD\nZAR\n");
        update_rate(&mut session).unwrap();
        convert(&mut session).unwrap();
        let text = out.text();
        assert!(text.contains("1 USD = 20.0000 ZAR"));
        assert!(text.contains("$100.00 = R2,000.00"));
    }

    #[test]
    fn test_cannot_remove_base() {
        let (mut session, _, _dir) = session("ZAR\n");
        assert!(remove_currency(&mut session).is_err());
    }
}
