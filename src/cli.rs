use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Study planner with a scripting CLI and a terminal UI.
/// Data lives in ~/.cplan unless --data-dir or CPLAN_DIR says otherwise.
#[derive(Parser)]
#[command(name = "cplan", version, about = "Campus study planner")]
pub struct Cli {
    /// Directory holding the planner's data files.
    #[arg(long, global = true, env = "CPLAN_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
