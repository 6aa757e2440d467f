//! Categories menu: registry, rules and per-transaction overrides

use crate::display::{format_category_tree, format_transaction_details, rule_table, transaction_table};
use crate::error::DashboardResult;
use crate::services::category::RuleUpdate;
use crate::services::{Categorization, CategoryService};

use super::{submenu, Handler, Session};

const ITEMS: &[(&str, Handler)] = &[
    ("List categories", list_categories),
    ("Add category", add_category),
    ("Add label to a category", add_label),
    ("Edit category description", edit_description),
    ("Activate or deactivate a category", toggle_category),
    ("Delete category", delete_category),
    ("List rules (priority order)", list_rules),
    ("Add rule", add_rule),
    ("Edit rule", edit_rule),
    ("Remove rule", remove_rule),
    ("Test a description", test_description),
    ("Re-categorize all transactions", recategorize),
    ("Show uncategorized transactions", uncategorized),
    ("Show a transaction", show_transaction),
    ("Override a transaction's category", override_transaction),
    ("Clear a manual override", clear_override),
    ("Exclude a transaction", exclude_transaction),
    ("Restore an excluded transaction", restore_transaction),
];

pub fn run(session: &mut Session) -> DashboardResult<()> {
    submenu(session, "Categories and rules", ITEMS)
}

fn list_categories(session: &mut Session) -> DashboardResult<()> {
    let categories = CategoryService::new(&session.storage).list_categories()?;
    session.console.write(&format_category_tree(&categories))
}

fn add_category(session: &mut Session) -> DashboardResult<()> {
    let name = session.console.ask_required("Category name: ")?;
    let description = session.console.ask("Description (optional): ")?;
    let category = CategoryService::new(&session.storage).create_category(&name, &description)?;
    session
        .console
        .say(format!("Created category: {}", category.name))
}

fn add_label(session: &mut Session) -> DashboardResult<()> {
    let category = session.console.ask_required("Category: ")?;
    let name = session.console.ask_required("Label name: ")?;
    let description = session.console.ask("Description (optional): ")?;
    let label = CategoryService::new(&session.storage).add_label(&category, &name, &description)?;
    session
        .console
        .say(format!("Added label {}/{}", category.trim().to_lowercase(), label.name))
}

fn edit_description(session: &mut Session) -> DashboardResult<()> {
    let name = session.console.ask_required("Category: ")?;
    let service = CategoryService::new(&session.storage);
    let current = service.get_category(&name)?;
    let description = session
        .console
        .ask_with_default("Description", &current.description)?;
    let updated = service.update_description(&current.name, &description)?;
    session
        .console
        .say(format!("{} - {}", updated.name, updated.description))
}

fn toggle_category(session: &mut Session) -> DashboardResult<()> {
    let name = session.console.ask_required("Category: ")?;
    let service = CategoryService::new(&session.storage);
    let current = service.get_category(&name)?;
    let updated = service.set_category_active(&current.name, !current.active)?;
    session.console.say(format!(
        "Category '{}' is now {}",
        updated.name,
        if updated.active { "active" } else { "inactive" }
    ))
}

fn delete_category(session: &mut Session) -> DashboardResult<()> {
    let name = session.console.ask_required("Category: ")?;
    let service = CategoryService::new(&session.storage);
    let category = service.get_category(&name)?;
    let (transactions, rules) = service.usage(&category.name)?;

    let force = if transactions > 0 || rules > 0 {
        session.console.say(format!(
            "'{}' is used by {} transactions and {} rules.",
            category.name, transactions, rules
        ))?;
        if !session.console.confirm("Delete anyway?")? {
            return session.console.say("Nothing deleted.");
        }
        true
    } else {
        false
    };

    let removed = service.delete_category(&category.name, force)?;
    session
        .console
        .say(format!("Deleted category: {}", removed.name))
}

fn list_rules(session: &mut Session) -> DashboardResult<()> {
    let rules = CategoryService::new(&session.storage).rules_by_priority()?;
    session.console.write(&rule_table(&rules))
}

fn add_rule(session: &mut Session) -> DashboardResult<()> {
    let pattern = session.console.ask_required("Pattern (text to find in descriptions): ")?;
    let category = session.console.ask_required("Category (category or category/label): ")?;
    let entity = session.console.ask_optional("Entity (optional): ")?;
    let rule = CategoryService::new(&session.storage).add_rule(&pattern, &category, entity.as_deref())?;
    session.console.say(format!("Added rule {}: {}", rule.id.short(), rule))
}

fn edit_rule(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Rule ID or pattern: ")?;
    let service = CategoryService::new(&session.storage);
    let rule = service.find_rule(&input)?;
    session.console.say(format!("Editing {}. Leave blank to keep a value.", rule))?;

    let pattern = session.console.ask_optional(&format!("Pattern [{}]: ", rule.pattern))?;
    let category = session.console.ask_optional(&format!("Category [{}]: ", rule.category))?;
    let entity = session.console.ask_optional(&format!(
        "Entity [{}] ('-' clears): ",
        rule.entity.as_deref().unwrap_or("none")
    ))?;
    let active = session.console.ask_optional(&format!(
        "Active [{}] (y/n): ",
        if rule.active { "y" } else { "n" }
    ))?;

    let update = RuleUpdate {
        pattern,
        category,
        entity: entity.map(|e| if e == "-" { None } else { Some(e) }),
        active: active.map(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes")),
    };
    let updated = service.update_rule(&rule.id.as_uuid().to_string(), update)?;
    session.console.say(format!("Updated rule: {}", updated))
}

fn remove_rule(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Rule ID or pattern: ")?;
    let removed = CategoryService::new(&session.storage).remove_rule(&input)?;
    session.console.say(format!("Removed rule: {}", removed))
}

fn test_description(session: &mut Session) -> DashboardResult<()> {
    let description = session.console.ask_required("Description: ")?;
    let outcome = CategoryService::new(&session.storage).test_description(&description)?;
    match outcome {
        Categorization::Matched {
            category, entity, ..
        } => session.console.say(format!(
            "-> {} ({})",
            category,
            entity.as_deref().unwrap_or("no entity")
        )),
        Categorization::Uncategorized => session.console.say("-> Uncategorized"),
    }
}

fn recategorize(session: &mut Session) -> DashboardResult<()> {
    let summary = CategoryService::new(&session.storage).recategorize_all()?;
    session.console.say(format!(
        "Examined {} transactions: {} changed, {} manual overrides kept, {} uncategorized",
        summary.examined, summary.changed, summary.manual_skipped, summary.uncategorized
    ))
}

fn uncategorized(session: &mut Session) -> DashboardResult<()> {
    let transactions = CategoryService::new(&session.storage).uncategorized()?;
    let currencies = session.storage.currencies.get()?;
    session
        .console
        .write(&transaction_table(&transactions, &currencies))?;
    session
        .console
        .say(format!("{} uncategorized transactions", transactions.len()))
}

fn show_transaction(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Transaction ID: ")?;
    let txn = CategoryService::new(&session.storage).find_transaction(&input)?;
    let currencies = session.storage.currencies.get()?;
    session
        .console
        .write(&format_transaction_details(&txn, &currencies))
}

fn override_transaction(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Transaction ID: ")?;
    let category = session.console.ask_optional("Category (blank for none): ")?;
    let entity = session.console.ask_optional("Entity (optional): ")?;
    let txn = CategoryService::new(&session.storage).set_manual_category(
        &input,
        category.as_deref(),
        entity.as_deref(),
    )?;
    session.console.say(format!(
        "{} -> {} (manual)",
        txn.id.short(),
        txn.category.as_deref().unwrap_or("uncategorized")
    ))
}

fn clear_override(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Transaction ID: ")?;
    let txn = CategoryService::new(&session.storage).clear_override(&input)?;
    session.console.say(format!(
        "{} -> {} ({})",
        txn.id.short(),
        txn.category.as_deref().unwrap_or("uncategorized"),
        txn.category_source
    ))
}

fn exclude_transaction(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Transaction ID: ")?;
    let txn = CategoryService::new(&session.storage).exclude_transaction(&input)?;
    session
        .console
        .say(format!("Excluded {} from reports", txn.id.short()))
}

fn restore_transaction(session: &mut Session) -> DashboardResult<()> {
    let input = session.console.ask_required("Transaction ID: ")?;
    let txn = CategoryService::new(&session.storage).restore_transaction(&input)?;
    session.console.say(format!("Restored {}", txn.id.short()))
}
