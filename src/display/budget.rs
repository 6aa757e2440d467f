//! Budget and currency listings

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Budget, CurrencyConfig};

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Target")]
    target: String,
}

pub fn budget_table(budgets: &[Budget], currencies: &CurrencyConfig) -> String {
    if budgets.is_empty() {
        return "No budgets defined.\n".to_string();
    }

    let rows = budgets.iter().map(|b| BudgetRow {
        id: b.id.short(),
        period: b.period.to_string(),
        entity: b.entity.clone(),
        category: b.category.clone().unwrap_or_else(|| "(all)".into()),
        target: currencies.format(b.target, &b.currency),
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n", table)
}

#[derive(Tabled)]
struct CurrencyRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "1 unit in base")]
    rate: String,
    #[tabled(rename = "")]
    flags: String,
}

/// The currency table with base and default markers
pub fn currency_table(config: &CurrencyConfig) -> String {
    let rows = config.currencies.iter().map(|c| {
        let mut flags = Vec::new();
        if config.is_base(&c.code) {
            flags.push("base");
        }
        if c.code.eq_ignore_ascii_case(&config.default_code) {
            flags.push("default");
        }
        CurrencyRow {
            code: c.code.clone(),
            symbol: c.symbol.clone(),
            name: c.name.clone(),
            rate: format!("{:.4}", c.rate_to_base),
            flags: flags.join(", "),
        }
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!(
        "{}\nRates as of {}\n",
        table,
        config.updated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Period};

    #[test]
    fn test_budget_table() {
        let budget = Budget::new("Dad", Some("motors".into()), Period::month(2025, 1), Money::from_units(1_500));
        let text = budget_table(&[budget], &CurrencyConfig::default());
        assert!(text.contains("2025-01"));
        assert!(text.contains("motors"));
        assert!(text.contains("R1,500.00"));
    }

    #[test]
    fn test_currency_table_flags() {
        let mut config = CurrencyConfig::default();
        config.default_code = "USD".into();
        let text = currency_table(&config);
        assert!(text.contains("base"));
        assert!(text.contains("default"));
        assert!(text.contains("18.5000"));
    }
}
