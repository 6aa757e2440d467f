//! Display formatting for terminal output
//!
//! Tables for listings (via `tabled`) and the text helpers the reports use.

pub mod budget;
pub mod category;
pub mod report;
pub mod transaction;

pub use budget::{budget_table, currency_table};
pub use category::{format_category_tree, rule_table};
pub use transaction::{format_transaction_details, import_preview_table, transaction_table};
