//! Interactive numbered menu
//!
//! The top level offers options 1-9 and 0 to exit. Each option maps to a
//! handler through `MENU_HANDLERS`; sub-menus use the same table shape with
//! 0 meaning back. Handler errors are printed and the menu is shown again.

pub mod analysis;
pub mod budget;
pub mod category;
pub mod config;
pub mod console;
pub mod currency;
pub mod import;
pub mod report;
pub mod tax;
pub mod workspace;

pub use console::Console;

use std::fmt;

use tracing::debug;

use crate::config::settings::Settings;
use crate::error::{DashboardError, DashboardResult};
use crate::storage::Storage;

/// Everything a menu handler works with
pub struct Session {
    pub storage: Storage,
    pub settings: Settings,
    pub console: Console,
}

impl Session {
    pub fn new(storage: Storage, settings: Settings, console: Console) -> Self {
        Self {
            storage,
            settings,
            console,
        }
    }

    /// Persist settings changes
    pub fn save_settings(&self) -> DashboardResult<()> {
        self.settings.save(self.storage.paths())
    }

    /// Re-read settings and every document, e.g. after a restore
    pub fn reload(&mut self) -> DashboardResult<()> {
        self.settings = Settings::load_or_create(self.storage.paths())?;
        self.storage.load_all()
    }
}

/// A menu action
pub type Handler = fn(&mut Session) -> DashboardResult<()>;

/// Top-level menu options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Import,
    Reports,
    Categories,
    Budgets,
    Tax,
    Workspace,
    Currency,
    Analysis,
    Configuration,
    Exit,
}

impl MenuCommand {
    /// Options in display order, exit last
    pub fn all() -> &'static [MenuCommand] {
        &[
            Self::Import,
            Self::Reports,
            Self::Categories,
            Self::Budgets,
            Self::Tax,
            Self::Workspace,
            Self::Currency,
            Self::Analysis,
            Self::Configuration,
            Self::Exit,
        ]
    }

    pub fn number(&self) -> u8 {
        match self {
            Self::Import => 1,
            Self::Reports => 2,
            Self::Categories => 3,
            Self::Budgets => 4,
            Self::Tax => 5,
            Self::Workspace => 6,
            Self::Currency => 7,
            Self::Analysis => 8,
            Self::Configuration => 9,
            Self::Exit => 0,
        }
    }

    /// Parse a menu selection; anything but 0-9 is rejected
    pub fn parse(input: &str) -> Option<Self> {
        let number: u8 = input.trim().parse().ok()?;
        Self::all().iter().copied().find(|c| c.number() == number)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Import => "Import bank statement",
            Self::Reports => "Reports",
            Self::Categories => "Categories and rules",
            Self::Budgets => "Budgets",
            Self::Tax => "Tax",
            Self::Workspace => "Workspace",
            Self::Currency => "Currency settings",
            Self::Analysis => "Analysis",
            Self::Configuration => "Configuration",
            Self::Exit => "Exit",
        }
    }
}

impl fmt::Display for MenuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

static MENU_HANDLERS: &[(MenuCommand, Handler)] = &[
    (MenuCommand::Import, import::run),
    (MenuCommand::Reports, report::run),
    (MenuCommand::Categories, category::run),
    (MenuCommand::Budgets, budget::run),
    (MenuCommand::Tax, tax::run),
    (MenuCommand::Workspace, workspace::run),
    (MenuCommand::Currency, currency::run),
    (MenuCommand::Analysis, analysis::run),
    (MenuCommand::Configuration, config::run),
];

/// The handler for a menu option; `None` for Exit
pub fn handler_for(command: MenuCommand) -> Option<Handler> {
    MENU_HANDLERS
        .iter()
        .find(|(c, _)| *c == command)
        .map(|(_, h)| *h)
}

/// Run a handler, printing its error instead of returning it
///
/// Only `InputClosed` propagates, so end of input unwinds every menu level.
fn dispatch(session: &mut Session, handler: Handler) -> DashboardResult<()> {
    match handler(session) {
        Err(DashboardError::InputClosed) => Err(DashboardError::InputClosed),
        Err(e) => {
            debug!(error = ?e, "menu action failed");
            session.console.say(format!("Error: {}", e))
        }
        Ok(()) => Ok(()),
    }
}

/// Run the top-level menu until Exit or end of input
pub fn run_menu(session: &mut Session) -> DashboardResult<()> {
    session.console.say("InOut Dashboard")?;

    loop {
        session.console.say("")?;
        for command in MenuCommand::all() {
            session.console.say(command)?;
        }

        let Some(input) = session.console.read_line("Select an option: ")? else {
            return Ok(());
        };

        let command = match MenuCommand::parse(&input) {
            Some(command) => command,
            None => {
                session
                    .console
                    .say(format!("Invalid choice '{}'. Enter a number from 0 to 9.", input))?;
                continue;
            }
        };

        let Some(handler) = handler_for(command) else {
            session.console.say("Goodbye.")?;
            return Ok(());
        };

        match dispatch(session, handler) {
            Err(DashboardError::InputClosed) => return Ok(()),
            other => other?,
        }
    }
}

/// Show a numbered sub-menu until the user picks 0 (back)
pub fn submenu(session: &mut Session, title: &str, items: &[(&str, Handler)]) -> DashboardResult<()> {
    loop {
        session.console.say("")?;
        session.console.say(format!("== {} ==", title))?;
        for (i, (label, _)) in items.iter().enumerate() {
            session.console.say(format!("{}. {}", i + 1, label))?;
        }
        session.console.say("0. Back")?;

        let input = session.console.ask("Select an option: ")?;
        let choice = match input.parse::<usize>() {
            Ok(0) => return Ok(()),
            Ok(n) => n.checked_sub(1).and_then(|i| items.get(i)),
            Err(_) => None,
        };

        match choice {
            Some((_, handler)) => dispatch(session, *handler)?,
            None => session.console.say(format!(
                "Invalid choice '{}'. Enter a number from 0 to {}.",
                input,
                items.len()
            ))?,
        }
    }
}
