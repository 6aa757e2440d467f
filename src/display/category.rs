//! Category registry and rule formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Category, CategoryRule};

use super::report::truncate;

/// Categories with their labels as a tree
pub fn format_category_tree(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n".to_string();
    }

    let mut output = String::new();
    for category in categories {
        let inactive = if category.active { "" } else { " (inactive)" };
        if category.description.is_empty() {
            output.push_str(&format!("{}{}\n", category.name, inactive));
        } else {
            output.push_str(&format!(
                "{}{} - {}\n",
                category.name, inactive, category.description
            ));
        }

        for (i, label) in category.labels.iter().enumerate() {
            let branch = if i + 1 == category.labels.len() {
                "└── "
            } else {
                "├── "
            };
            let inactive = if label.active { "" } else { " (inactive)" };
            output.push_str(&format!("  {}{}{}\n", branch, label.name, inactive));
        }
    }
    output
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Active")]
    active: &'static str,
}

/// Rules in the order given, numbered from 1
pub fn rule_table(rules: &[CategoryRule]) -> String {
    if rules.is_empty() {
        return "No rules defined.\n".to_string();
    }

    let rows = rules.iter().enumerate().map(|(i, r)| RuleRow {
        position: i + 1,
        id: r.id.short(),
        pattern: truncate(&r.pattern, 30),
        category: r.category.clone(),
        entity: r.entity.clone().unwrap_or_else(|| "-".into()),
        active: if r.active { "yes" } else { "no" },
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tree() {
        let mut home = Category::new("home", "Household costs")
            .with_label("rent", "")
            .with_label("electricity", "");
        home.labels[1].active = false;
        let text = format_category_tree(&[home]);

        assert!(text.starts_with("home - Household costs\n"));
        assert!(text.contains("├── rent\n"));
        assert!(text.contains("└── electricity (inactive)\n"));
    }

    #[test]
    fn test_rule_table() {
        let mut rule = CategoryRule::new("SASOL", "motors/fuel", Some("Dad".into()));
        rule.active = false;
        let text = rule_table(&[rule]);
        assert!(text.contains("SASOL"));
        assert!(text.contains("motors/fuel"));
        assert!(text.contains("no"));
        assert_eq!(rule_table(&[]), "No rules defined.\n");
    }
}
