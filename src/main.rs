//! # tasks - team task tracker CLI
//!
//! Command-line front end for the team task tracker. It plays the role of the
//! Mini-App pages: lists and filters tasks, creates, edits, completes and deletes
//! them against the remote list API, and prints the KPI dashboard.
//!
//! ## Quick Start
//!
//! ```bash
//! # Point at the list API
//! export TEAMTASKS_BASE_URL=https://my-backend.example.com
//!
//! # List pending tasks of team 1
//! tasks list --team 1 --pending
//!
//! # Add a task
//! tasks add "Implement login form" --module 2 --team 1 --story-points 8 --estimate 3
//!
//! # Complete it (prompts for hours when --actual-time is omitted)
//! tasks complete 17 --actual-time 2.5
//!
//! # KPI dashboard
//! tasks kpi
//! ```
//!
//! Every command first shows the cached task snapshot from `~/.teamtasks/tasks.json`,
//! then replaces it with the remote list. If the backend is unreachable the cached
//! tasks are used and a warning is printed.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use teamtasks::cache::TaskCache;
use teamtasks::launch::LaunchParams;
use teamtasks::{Config, HttpGateway, LocalStore, Reconciler, TaskFilter};

pub mod cli;
pub mod cmd;
pub mod display;

use cli::Cli;
use cmd::*;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that need neither config nor network
    match &cli.command {
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        Commands::Whoami => {
            cmd_whoami(&LaunchParams::resolve(cli.phone.clone(), cli.launch_url.as_deref()));
            return;
        }
        _ => {}
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(team) = cli.team_id {
        config.team_id = team;
    }

    let store = LocalStore::with_cache(TaskCache::in_dir(&config.cache_dir));
    let gateway = HttpGateway::from_config(&config);
    let mut rec = Reconciler::new(gateway, store, &config);

    let report = rec.load().await;
    if !report.tasks_refreshed {
        let base_url = rec.gateway().base_url();
        if report.hydrated_from_cache {
            eprintln!("Backend unreachable at {base_url}; showing cached tasks.");
        } else {
            eprintln!("Backend unreachable at {base_url}; no cached tasks.");
        }
    }

    match cli.command {
        Commands::Completions { .. } | Commands::Whoami => unreachable!("handled above"),

        Commands::List {
            team,
            module,
            employee,
            pending,
            priority,
            sort,
            limit,
        } => {
            let filter = TaskFilter {
                team_id: team,
                module_id: module,
                employee_id: employee,
            };
            cmd_list(&rec, filter, pending, priority, sort, limit)
        }

        Commands::View { id } => cmd_view(&rec, id),

        Commands::Add {
            description,
            module,
            team,
            responsible,
            story_points,
            estimate,
            date_limit,
        } => {
            cmd_add(
                &mut rec,
                description,
                module,
                team,
                responsible,
                story_points,
                estimate,
                date_limit,
            )
            .await
        }

        Commands::Update {
            id,
            description,
            module,
            team,
            responsible,
            story_points,
            estimate,
            date_limit,
            clear_date_limit,
            clear_responsible,
        } => {
            let edit = build_update(
                description,
                module,
                team,
                responsible,
                story_points,
                estimate,
                date_limit,
                clear_date_limit,
                clear_responsible,
            );
            cmd_update(&mut rec, id, edit).await
        }

        Commands::Complete { id, actual_time } => cmd_complete(&mut rec, id, actual_time).await,

        Commands::Reopen { id } => cmd_reopen(&mut rec, id).await,

        Commands::Delete { id } => cmd_delete(&mut rec, id).await,

        Commands::Modules => cmd_modules(&rec),

        Commands::Teams => cmd_teams(&rec),

        Commands::Employees => cmd_employees(&rec),

        Commands::Kpi {
            team,
            module,
            employee,
        } => cmd_kpi(
            &rec,
            TaskFilter {
                team_id: team,
                module_id: module,
                employee_id: employee,
            },
        ),

        Commands::Urgent { team, employee } => cmd_urgent(
            &rec,
            TaskFilter {
                team_id: team,
                module_id: None,
                employee_id: employee,
            },
        ),

        Commands::Employee { id } => cmd_employee(&rec, id),

        Commands::Recommend => cmd_recommend(&rec).await,
    }
}
