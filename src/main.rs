//! # cplan - Campus study planner
//!
//! A terminal planner for study sessions: each task has a title, a duration in
//! minutes, a due date and an optional tag. Tasks can be managed from scripts
//! through the CLI or interactively through the TUI.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task due today
//! cplan add "Read chapter 4" --duration 45 --tag Study
//!
//! # List this week's tasks, longest first
//! cplan list --range week --sort duration --desc
//!
//! # Launch the TUI
//! cplan ui
//! ```
//!
//! ## Key Commands
//!
//! - `cplan ui` - Interactive table, search, forms and dashboard
//! - `cplan add <title>` - Create a validated task
//! - `cplan list` - Filter by tag, date range and search query
//! - `cplan dashboard` - Totals, 7-day trend and daily target progress
//! - `cplan export` / `cplan import <file>` - JSON backup and restore
//!
//! Data is stored in `~/.cplan/` (or `--data-dir` / `CPLAN_DIR`), one JSON
//! file per key. Logs go to `logs/cplan.log` inside the same directory.

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod filter;
pub mod format;
pub mod logging;
pub mod search;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod store;
pub mod task;
pub mod validate;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod dashboard;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
}

use cli::Cli;
use cmd::*;
use config::Config;
use storage::FileStore;
use store::TaskStore;

fn main() {
    let cli = Cli::parse();

    // Completions need no data directory.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let config = match Config::resolve(cli.data_dir.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let _log_guard = logging::init_logging(&config);

    let store = FileStore::open(&config.data_dir)
        .map_err(error::StoreError::from)
        .and_then(TaskStore::open);
    let mut store = match store {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open data directory {}: {}", config.data_dir.display(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Ui => cmd_ui(store),

        Commands::Add { title, duration, due, tag } => cmd_add(&mut store, title, duration, due, tag),

        Commands::Update { id, title, duration, due, tag, clear_tag } =>
            cmd_update(&mut store, id, title, duration, due, tag, clear_tag),

        Commands::Delete { id } => cmd_delete(&mut store, id),

        Commands::View { id } => cmd_view(&store, id),

        Commands::List { tag, range, search, sort, desc, limit } =>
            cmd_list(&store, tag, range, search, sort, desc, limit),

        Commands::Search { query, regex, mark } => cmd_search(&store, query, regex, mark),

        Commands::Dashboard => cmd_dashboard(&store),

        Commands::Settings { unit, daily_target } => cmd_settings(&mut store, unit, daily_target),

        Commands::Theme { toggle } => cmd_theme(&mut store, toggle),

        Commands::Export { output, raw } => cmd_export(&store, output, raw),

        Commands::Import { input, no_backup } => cmd_import(&mut store, &config.data_dir, input, no_backup),

        Commands::Tags => cmd_tags(&store),
    }
}
