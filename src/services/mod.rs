//! Service layer
//!
//! Business logic on top of the storage layer: importing statements,
//! categorizing, budgets, currencies, tax estimates, analysis and workspace
//! housekeeping. Services borrow a `Storage` and hold no state of their own.

pub mod analysis;
pub mod budget;
pub mod categorizer;
pub mod category;
pub mod currency;
pub mod import;
pub mod tax;
pub mod workspace;

pub use analysis::AnalysisService;
pub use budget::{BudgetEvaluation, BudgetService, BudgetStatus};
pub use categorizer::{Categorization, Categorizer};
pub use category::CategoryService;
pub use currency::CurrencyService;
pub use import::{BankProfile, ImportOptions, ImportResult, ImportService};
pub use tax::{TaxService, TaxpayerKind};
pub use workspace::WorkspaceService;
