use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Team task tracker backed by the remote list API.
/// Tasks are cached locally under --cache-dir (default ~/.teamtasks).
#[derive(Parser)]
#[command(name = "tasks", version, about = "Team task tracker and KPI dashboard")]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the list API (overrides config and TEAMTASKS_BASE_URL).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory for the task snapshot cache.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Team whose employees are loaded.
    #[arg(long, global = true)]
    pub team_id: Option<u64>,

    /// Contact phone passed on app entry. Shown read-only.
    #[arg(long, global = true)]
    pub phone: Option<String>,

    /// Launch URL carrying a `phone` query parameter.
    #[arg(long, global = true)]
    pub launch_url: Option<String>,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
