//! Task Aggregation Engine.
//!
//! Pure functions over a borrowed [`Dataset`]: filtering by team/module/employee,
//! per-module completion and time rollups, priority buckets, urgent-task groups,
//! per-team summaries and employee drill-downs. Nothing is cached; every view is
//! recomputed from the current store contents.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::fields::*;
use crate::task::{Employee, Module, Task, Team, UNKNOWN_MODULE};

/// Borrowed snapshot of the four collections.
#[derive(Debug, Clone, Copy)]
pub struct Dataset<'a> {
    pub tasks: &'a [Task],
    pub modules: &'a [Module],
    pub teams: &'a [Team],
    pub employees: &'a [Employee],
}

/// Optional constraints on team, module and responsible employee.
///
/// All active predicates must hold; an empty filter matches every task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub team_id: Option<u64>,
    pub module_id: Option<u64>,
    pub employee_id: Option<u64>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.team_id.is_none() && self.module_id.is_none() && self.employee_id.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(team) = self.team_id {
            if task.team_id != Some(team) {
                return false;
            }
        }
        if let Some(module) = self.module_id {
            if task.module_id != Some(module) {
                return false;
            }
        }
        if let Some(employee) = self.employee_id {
            if task.responsible != Some(employee) {
                return false;
            }
        }
        true
    }

    /// Same filter with the module dimension dropped.
    pub fn without_module(self) -> Self {
        Self {
            module_id: None,
            ..self
        }
    }
}

fn as_task<T: Borrow<Task>>(t: &T) -> &Task {
    <T as Borrow<Task>>::borrow(t)
}

pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// `round(completed / total * 100)`, 0 for an empty group.
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Title of the module a task references, or the synthetic unknown-module title.
pub fn module_title(modules: &[Module], module_id: Option<u64>) -> String {
    module_id
        .and_then(|id| modules.iter().find(|m| m.id == id))
        .map(Module::display_title)
        .unwrap_or_else(|| UNKNOWN_MODULE.to_string())
}

/// Completion and time rollup for one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStats {
    pub module_id: u64,
    pub title: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_pct: u8,
    /// Sum of actual time over completed tasks.
    pub hours_spent: f64,
    /// `hours_spent / total_tasks`, one decimal, 0 for an empty module.
    pub avg_time_per_task: f64,
}

impl ModuleStats {
    fn compute<T: Borrow<Task>>(module: &Module, tasks: &[T]) -> Self {
        let total_tasks = tasks.len();
        let completed_tasks = tasks.iter().map(as_task).filter(|t| t.done).count();
        let hours_spent: f64 = tasks.iter().map(as_task).map(Task::hours_spent).sum();
        let avg_time_per_task = if total_tasks == 0 {
            0.0
        } else {
            round_one_decimal(hours_spent / total_tasks as f64)
        };
        Self {
            module_id: module.id,
            title: module.display_title(),
            total_tasks,
            completed_tasks,
            completion_pct: completion_percentage(completed_tasks, total_tasks),
            hours_spent,
            avg_time_per_task,
        }
    }
}

/// Partition tasks by module, in module order. Every module gets a group, possibly
/// empty; tasks whose module is not listed belong to no group.
pub fn group_by_module<'t, 'm, T: Borrow<Task>>(tasks: &'t [T], modules: &'m [Module]) -> Vec<(&'m Module, Vec<&'t Task>)> {
    modules
        .iter()
        .map(|m| {
            let group = tasks
                .iter()
                .map(as_task)
                .filter(|t| t.module_id == Some(m.id))
                .collect();
            (m, group)
        })
        .collect()
}

/// Per-module statistics, one row per module including modules with no tasks.
pub fn module_stats<T: Borrow<Task>>(tasks: &[T], modules: &[Module]) -> Vec<ModuleStats> {
    group_by_module(tasks, modules)
        .into_iter()
        .map(|(m, group)| ModuleStats::compute(m, &group))
        .collect()
}

/// Estimated hours over all of a module's tasks against actual hours over its completed ones.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeComparison {
    pub module_id: u64,
    pub title: String,
    pub estimated_hours: f64,
    pub actual_hours: f64,
}

pub fn time_comparison<T: Borrow<Task>>(tasks: &[T], modules: &[Module]) -> Vec<TimeComparison> {
    group_by_module(tasks, modules)
        .into_iter()
        .map(|(m, group)| TimeComparison {
            module_id: m.id,
            title: m.display_title(),
            estimated_hours: group.iter().map(|t| t.estimated_time).sum(),
            actual_hours: group.iter().map(|t| t.hours_spent()).sum(),
        })
        .collect()
}

/// Number of tasks in each priority bucket. All three buckets are present.
pub fn priority_breakdown<T: Borrow<Task>>(tasks: &[T]) -> BTreeMap<Priority, usize> {
    let mut counts: BTreeMap<Priority, usize> =
        [Priority::Low, Priority::Medium, Priority::High].into_iter().map(|p| (p, 0)).collect();
    for t in tasks {
        *counts.entry(as_task(t).priority()).or_default() += 1;
    }
    counts
}

/// High-priority tasks of one module.
#[derive(Debug, Clone, PartialEq)]
pub struct UrgentGroup {
    pub module_id: u64,
    pub title: String,
    pub task_ids: Vec<u64>,
    pub total_story_points: u32,
    pub completion_pct: u8,
}

/// Tasks with story points at or above the high threshold, grouped by module.
pub fn urgent_by_module<T: Borrow<Task>>(tasks: &[T], modules: &[Module]) -> Vec<UrgentGroup> {
    group_by_module(tasks, modules)
        .into_iter()
        .map(|(m, group)| {
            let urgent: Vec<&Task> = group.into_iter().filter(|t| t.is_urgent()).collect();
            let done = urgent.iter().filter(|t| t.done).count();
            UrgentGroup {
                module_id: m.id,
                title: m.display_title(),
                total_story_points: urgent.iter().map(|t| t.story_points as u32).sum(),
                completion_pct: completion_percentage(done, urgent.len()),
                task_ids: urgent.iter().map(|t| t.id).collect(),
            }
        })
        .collect()
}

/// Task counts for one team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSummary {
    pub team_id: u64,
    pub name: String,
    pub color: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

pub fn team_summaries<T: Borrow<Task>>(tasks: &[T], teams: &[Team]) -> Vec<TeamSummary> {
    teams
        .iter()
        .map(|team| {
            let mine: Vec<&Task> = tasks
                .iter()
                .map(as_task)
                .filter(|t| t.team_id == Some(team.id))
                .collect();
            TeamSummary {
                team_id: team.id,
                name: team.name.clone(),
                color: team.color.clone(),
                total_tasks: mine.len(),
                completed_tasks: mine.iter().filter(|t| t.done).count(),
            }
        })
        .collect()
}

/// Drill-down over an employee's embedded completed-task list.
///
/// The counters come straight from the employees API and are not recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeDrilldown {
    pub employee_id: u64,
    pub name: String,
    pub tasks_completed: u32,
    pub hours_worked: f64,
    pub progress_pct: u8,
    /// Only modules the employee has tasks in.
    pub modules: Vec<ModuleStats>,
    pub time: Vec<TimeComparison>,
}

pub fn employee_drilldown(employee: &Employee, modules: &[Module]) -> EmployeeDrilldown {
    let tasks = &employee.tasks_completed;
    let done = tasks.iter().filter(|t| t.done).count();
    let stats: Vec<ModuleStats> = module_stats(tasks, modules)
        .into_iter()
        .filter(|s| s.total_tasks > 0)
        .collect();
    let time = time_comparison(tasks, modules)
        .into_iter()
        .filter(|tc| stats.iter().any(|s| s.module_id == tc.module_id))
        .collect();
    EmployeeDrilldown {
        employee_id: employee.id,
        name: employee.display_name().to_string(),
        tasks_completed: employee.number_tasks_completed,
        hours_worked: employee.number_hours_worked,
        progress_pct: completion_percentage(done, tasks.len()),
        modules: stats,
        time,
    }
}

/// Everything the KPI view shows for one filter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<'a> {
    pub filter: TaskFilter,
    /// Tasks matching the full filter.
    pub tasks: Vec<&'a Task>,
    /// Per-module rows over the tasks matching the filter minus its module dimension.
    pub modules: Vec<ModuleStats>,
    pub time: Vec<TimeComparison>,
    pub urgent: Vec<UrgentGroup>,
    pub teams: Vec<TeamSummary>,
    pub priorities: BTreeMap<Priority, usize>,
    pub completion_pct: u8,
}

impl<'a> Dashboard<'a> {
    pub fn build(data: Dataset<'a>, filter: TaskFilter) -> Self {
        let tasks = filter_tasks(data.tasks, &filter);
        let grouped = filter_tasks(data.tasks, &filter.without_module());
        let done = tasks.iter().filter(|t| t.done).count();
        Self {
            filter,
            modules: module_stats(&grouped, data.modules),
            time: time_comparison(&grouped, data.modules),
            urgent: urgent_by_module(&grouped, data.modules),
            teams: team_summaries(&tasks, data.teams),
            priorities: priority_breakdown(&tasks),
            completion_pct: completion_percentage(done, tasks.len()),
            tasks,
        }
    }
}
