use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use inout_cli::cli::{console::Console, run_menu, Session};
use inout_cli::config::{paths::WorkspacePaths, settings::Settings};
use inout_cli::logging::init_tracing;
use inout_cli::storage::{init::initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "inout",
    version,
    about = "Terminal finance dashboard for South African households",
    long_about = "InOut imports bank statements, categorizes transactions with \
                  substring rules, tracks budgets per entity and estimates SA \
                  income tax, all from a numbered menu."
)]
struct Cli {
    /// Workspace directory (defaults to ~/financial_workspace)
    #[arg(short, long, env = "INOUT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = match cli.workspace {
        Some(dir) => WorkspacePaths::with_base_dir(dir),
        None => WorkspacePaths::new().context("Could not locate a workspace directory")?,
    };

    initialize_storage(&paths).with_context(|| {
        format!("Could not initialize workspace at {}", paths.base_dir().display())
    })?;
    debug!(workspace = %paths.base_dir().display(), "workspace ready");

    let storage = Storage::new(paths.clone()).context("Could not open storage")?;
    storage.load_all().context("Could not load workspace data")?;
    let settings = Settings::load_or_create(&paths).context("Could not load settings")?;

    let mut session = Session::new(storage, settings, Console::stdio());
    run_menu(&mut session)?;
    Ok(())
}
