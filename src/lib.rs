//! InOut Dashboard - terminal finance dashboard for South African households
//!
//! Bank statements come in as CSV, get categorized by substring rules, and
//! land in an append-only JSON store. Budgets, reports, tax estimates and
//! analyses are all computed from that store on demand.
//!
//! # Architecture
//!
//! - `config`: workspace paths and settings
//! - `error`: error taxonomy
//! - `models`: money, periods, transactions, rules, budgets, currencies
//! - `storage`: JSON file repositories
//! - `services`: import, categorization, budgets, tax, analysis
//! - `reports`: summaries and breakdowns rendered for the terminal
//! - `backup` / `export`: archives and data exports
//! - `cli`: the interactive numbered menu
//!
//! # Example
//!
//! ```rust,ignore
//! use inout_cli::config::{paths::WorkspacePaths, settings::Settings};
//!
//! let paths = WorkspacePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{DashboardError, DashboardResult};
