//! Command implementations for the CLI interface.
//!
//! Every handler works against a [`Reconciler`] that has already hydrated from the
//! snapshot cache and loaded the remote collections. Mutations report failures on
//! stderr and exit non-zero so the user can retry; nothing is applied locally
//! unless the backend confirmed it.

use std::io::{self, BufRead, Write};

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use teamtasks::fields::{Priority, SortKey};
use teamtasks::kpi::{employee_drilldown, filter_tasks, module_title, Dashboard};
use teamtasks::launch::LaunchParams;
use teamtasks::{Gateway, NewTask, ReconcileError, Reconciler, Task, TaskFilter, TaskUpdate};

use crate::cli::Cli;
use crate::display::*;

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks with optional filters.
    List {
        /// Filter by team ID.
        #[arg(long)]
        team: Option<u64>,
        /// Filter by module ID.
        #[arg(long)]
        module: Option<u64>,
        /// Filter by responsible employee ID.
        #[arg(long)]
        employee: Option<u64>,
        /// Only tasks not yet done.
        #[arg(long)]
        pending: bool,
        /// Only tasks in this priority bucket.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Id)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task.
    View {
        id: u64,
    },

    /// Create a task.
    Add {
        /// What needs to be done.
        description: String,
        #[arg(long)]
        module: Option<u64>,
        #[arg(long)]
        team: Option<u64>,
        /// Responsible employee ID.
        #[arg(long)]
        responsible: Option<u64>,
        /// Story points, 0-10. Drives priority.
        #[arg(long, default_value_t = 0)]
        story_points: u8,
        /// Estimated hours (capped at 4).
        #[arg(long, default_value_t = 0.0)]
        estimate: f64,
        /// Date limit: YYYY-MM-DD, "today", "tomorrow", "eow", "in Nd" or "in Nw".
        #[arg(long)]
        date_limit: Option<String>,
    },

    /// Update fields on a task.
    Update {
        id: u64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        module: Option<u64>,
        #[arg(long)]
        team: Option<u64>,
        #[arg(long)]
        responsible: Option<u64>,
        #[arg(long)]
        story_points: Option<u8>,
        #[arg(long)]
        estimate: Option<f64>,
        #[arg(long)]
        date_limit: Option<String>,
        /// Remove the date limit.
        #[arg(long)]
        clear_date_limit: bool,
        /// Remove the responsible employee.
        #[arg(long)]
        clear_responsible: bool,
    },

    /// Mark a task done. Prompts for hours spent when --actual-time is omitted.
    Complete {
        id: u64,
        /// Hours actually spent on the task.
        #[arg(long)]
        actual_time: Option<f64>,
    },

    /// Mark a done task as pending again.
    Reopen {
        id: u64,
    },

    /// Delete a task.
    Delete {
        id: u64,
    },

    /// List modules.
    Modules,

    /// List teams.
    Teams,

    /// List employees of the configured team.
    Employees,

    /// Per-module completion and time KPIs.
    Kpi {
        #[arg(long)]
        team: Option<u64>,
        #[arg(long)]
        module: Option<u64>,
        #[arg(long)]
        employee: Option<u64>,
    },

    /// Urgent tasks (7+ story points) grouped by module.
    Urgent {
        #[arg(long)]
        team: Option<u64>,
        #[arg(long)]
        employee: Option<u64>,
    },

    /// Drill into one employee's completed work.
    Employee {
        id: u64,
    },

    /// Show the suggested next task.
    Recommend,

    /// Show the contact passed on launch.
    Whoami,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn fail(err: ReconcileError) -> ! {
    eprintln!("Error: {err}");
    eprintln!("Nothing was changed. Fix the input or retry.");
    std::process::exit(1);
}

/// Generate shell completions to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

pub fn cmd_whoami(launch: &LaunchParams) {
    println!("Phone: {}", launch.display_phone());
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list<G: Gateway>(
    rec: &Reconciler<G>,
    filter: TaskFilter,
    pending: bool,
    priority: Option<Priority>,
    sort: SortKey,
    limit: Option<usize>,
) {
    let store = rec.store();
    let mut tasks: Vec<&Task> = filter_tasks(store.tasks(), &filter)
        .into_iter()
        .filter(|t| !pending || !t.done)
        .filter(|t| priority.map_or(true, |p| t.priority() == p))
        .collect();

    match sort {
        SortKey::Id => tasks.sort_by_key(|t| t.id),
        SortKey::Priority => tasks.sort_by(|a, b| b.story_points.cmp(&a.story_points).then(a.id.cmp(&b.id))),
        SortKey::DateLimit => tasks.sort_by_key(|t| (t.date_limit.unwrap_or(chrono::NaiveDate::MAX), t.id)),
    }
    if let Some(n) = limit {
        tasks.truncate(n);
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    print_task_table(&tasks, store.modules(), store.teams(), store.employees());
}

pub fn cmd_view<G: Gateway>(rec: &Reconciler<G>, id: u64) {
    let store = rec.store();
    let Some(task) = store.task(id) else {
        fail(ReconcileError::NotFound(id));
    };
    print_task_detail(task, store);
}

fn parse_date_or_exit(raw: &str) -> chrono::NaiveDate {
    match parse_date_input(raw) {
        Some(d) => d,
        None => {
            eprintln!("Unrecognised date limit. Use YYYY-MM-DD, 'today', 'tomorrow', 'eow' or 'in Nd'.");
            std::process::exit(1);
        }
    }
}

pub async fn cmd_add<G: Gateway>(
    rec: &mut Reconciler<G>,
    description: String,
    module: Option<u64>,
    team: Option<u64>,
    responsible: Option<u64>,
    story_points: u8,
    estimate: f64,
    date_limit: Option<String>,
) {
    let draft = NewTask {
        description,
        module_id: module,
        team_id: team,
        responsible,
        story_points,
        estimated_time: estimate,
        date_limit: date_limit.as_deref().map(parse_date_or_exit),
    };
    match rec.create(draft).await {
        Ok(task) => println!("Added task {} ({} priority)", task.id, task.priority().label()),
        Err(e) => fail(e),
    }
}

pub async fn cmd_update<G: Gateway>(rec: &mut Reconciler<G>, id: u64, edit: TaskUpdate) {
    if edit.is_empty() {
        println!("Nothing to update.");
        return;
    }
    match rec.update(id, &edit).await {
        Ok(task) => println!("Updated task {}", task.id),
        Err(e) => fail(e),
    }
}

/// Build a field edit from update flags, resolving the date limit input.
pub fn build_update(
    description: Option<String>,
    module: Option<u64>,
    team: Option<u64>,
    responsible: Option<u64>,
    story_points: Option<u8>,
    estimate: Option<f64>,
    date_limit: Option<String>,
    clear_date_limit: bool,
    clear_responsible: bool,
) -> TaskUpdate {
    TaskUpdate {
        description,
        module_id: module,
        team_id: team,
        responsible,
        story_points,
        estimated_time: estimate,
        date_limit: date_limit.as_deref().map(parse_date_or_exit),
        clear_date_limit,
        clear_responsible,
    }
}

/// Ask for the hours spent on a task. Empty input means no value.
fn prompt_actual_time(id: u64) -> Option<f64> {
    print!("Hours spent on task {id}: ");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.parse::<f64>() {
        Ok(h) => Some(h),
        Err(_) => {
            eprintln!("'{line}' is not a number of hours.");
            None
        }
    }
}

pub async fn cmd_complete<G: Gateway>(rec: &mut Reconciler<G>, id: u64, actual_time: Option<f64>) {
    match rec.store().task(id) {
        None => fail(ReconcileError::NotFound(id)),
        Some(t) if t.done => {
            println!("Task {id} is already done.");
            return;
        }
        Some(_) => {}
    }
    let hours = actual_time.or_else(|| prompt_actual_time(id));
    match rec.set_done(id, true, hours).await {
        Ok(task) => println!("Marked task {} done ({}).", task.id, format_hours(task.actual_time)),
        Err(e) => fail(e),
    }
}

pub async fn cmd_reopen<G: Gateway>(rec: &mut Reconciler<G>, id: u64) {
    match rec.set_done(id, false, None).await {
        Ok(task) => println!("Reopened task {}", task.id),
        Err(e) => fail(e),
    }
}

pub async fn cmd_delete<G: Gateway>(rec: &mut Reconciler<G>, id: u64) {
    match rec.delete(id).await {
        Ok(task) => println!("Deleted task {}: {}", task.id, task.description),
        Err(e) => fail(e),
    }
}

pub fn cmd_modules<G: Gateway>(rec: &Reconciler<G>) {
    let store = rec.store();
    if store.modules().is_empty() {
        println!("No modules.");
        return;
    }
    println!("{:<5} {:<24} {}", "ID", "Title", "Tasks");
    for m in store.modules() {
        let count = store.tasks().iter().filter(|t| t.module_id == Some(m.id)).count();
        println!("{:<5} {:<24} {}", m.id, truncate(&m.display_title(), 24), count);
    }
}

pub fn cmd_teams<G: Gateway>(rec: &Reconciler<G>) {
    let store = rec.store();
    if store.teams().is_empty() {
        println!("No teams.");
        return;
    }
    let dash = Dashboard::build(store.dataset(), TaskFilter::default());
    println!("{:<5} {:<16} {:<8} {:>6} {:>6}", "ID", "Name", "Color", "Tasks", "Done");
    for t in &dash.teams {
        println!(
            "{:<5} {:<16} {:<8} {:>6} {:>6}",
            t.team_id,
            truncate(&t.name, 16),
            t.color,
            t.total_tasks,
            t.completed_tasks
        );
    }
}

pub fn cmd_employees<G: Gateway>(rec: &Reconciler<G>) {
    let store = rec.store();
    if store.employees().is_empty() {
        println!("No employees.");
        return;
    }
    println!("{:<5} {:<16} {:<14} {:>10} {:>8}", "ID", "Name", "Role", "Completed", "Hours");
    for e in store.employees() {
        println!(
            "{:<5} {:<16} {:<14} {:>10} {:>8.1}",
            e.id,
            truncate(e.display_name(), 16),
            truncate(e.role.as_deref().unwrap_or("-"), 14),
            e.number_tasks_completed,
            e.number_hours_worked
        );
    }
}

pub fn cmd_kpi<G: Gateway>(rec: &Reconciler<G>, filter: TaskFilter) {
    let dash = Dashboard::build(rec.store().dataset(), filter);
    println!(
        "Tasks: {}  Done: {}%  Priority: {} high / {} medium / {} low\n",
        dash.tasks.len(),
        dash.completion_pct,
        dash.priorities[&Priority::High],
        dash.priorities[&Priority::Medium],
        dash.priorities[&Priority::Low],
    );
    print_module_stats(&dash.modules);
    println!("\nEstimated vs. actual time by module:");
    print_time_comparison(&dash.time);
}

pub fn cmd_urgent<G: Gateway>(rec: &Reconciler<G>, filter: TaskFilter) {
    let dash = Dashboard::build(rec.store().dataset(), filter);
    println!("{:<20} {:>7} {:>12} {:>11}", "Module", "Urgent", "Story pts", "Completion");
    for g in &dash.urgent {
        println!(
            "{:<20} {:>7} {:>12} {:>10}%",
            truncate(&g.title, 20),
            g.task_ids.len(),
            g.total_story_points,
            g.completion_pct
        );
    }
}

pub fn cmd_employee<G: Gateway>(rec: &Reconciler<G>, id: u64) {
    let store = rec.store();
    let Some(employee) = store.employee(id) else {
        eprintln!("Employee {id} not found in team.");
        std::process::exit(1);
    };
    print_drilldown(&employee_drilldown(employee, store.modules()));
}

pub async fn cmd_recommend<G: Gateway>(rec: &Reconciler<G>) {
    let Some(r) = rec.fetch_recommendation().await else {
        println!("No recommendations available at the moment.");
        return;
    };
    println!("Recommended: {}", r.title);
    println!("Description: {}", r.description);
    println!("Module:      {}", module_title(rec.store().modules(), r.module_id));
    println!("Story points: {} ({} priority)", r.story_points, r.priority().label());
    println!("Estimated:   {}", format_hours(Some(r.estimated_time)));
}
