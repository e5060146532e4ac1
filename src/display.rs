//! Plain-text rendering and date input helpers for the command-line front end.

use chrono::{Datelike, Duration, Local, NaiveDate};

use teamtasks::fields::Priority;
use teamtasks::kpi::{module_title, EmployeeDrilldown, ModuleStats, TimeComparison};
use teamtasks::normalize::parse_date_limit;
use teamtasks::task::UNKNOWN_MODULE;
use teamtasks::{Employee, LocalStore, Module, Task, Team};

/// Parse a date limit from user input.
///
/// Supports "today", "tomorrow", "end of week"/"eow", "in 3d", "in 2w" and
/// `YYYY-MM-DD` (or an ISO date-time).
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" => {
            let weekday = today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(6 - weekday));
        }
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Some(today + Duration::days(n));
        }
        if let Some(n) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Some(today + Duration::weeks(n));
        }
    }
    parse_date_limit(&s)
}

/// Format a date limit relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_date_limit(limit: Option<NaiveDate>, today: NaiveDate) -> String {
    match limit {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

pub fn format_done(done: bool) -> &'static str {
    if done {
        "done"
    } else {
        "pending"
    }
}

pub fn format_hours(hours: Option<f64>) -> String {
    hours.map(|h| format!("{h:.1}h")).unwrap_or_else(|| "-".into())
}

pub fn format_priority(p: Priority) -> String {
    p.label().to_string()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn team_name(teams: &[Team], id: Option<u64>) -> String {
    id.and_then(|id| teams.iter().find(|t| t.id == id))
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "-".into())
}

fn employee_name(employees: &[Employee], id: Option<u64>) -> String {
    match id {
        None => "-".into(),
        Some(id) => employees
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.display_name().to_string())
            .unwrap_or_else(|| format!("#{id}")),
    }
}

/// Print tasks as a table.
pub fn print_task_table(tasks: &[&Task], modules: &[Module], teams: &[Team], employees: &[Employee]) {
    println!(
        "{:<5} {:<8} {:<7} {:<3} {:<6} {:<6} {:<10} {:<16} {:<10} {:<12} {}",
        "ID", "Status", "Pri", "SP", "Est", "Act", "Limit", "Module", "Team", "Responsible", "Description"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        println!(
            "{:<5} {:<8} {:<7} {:<3} {:<6} {:<6} {:<10} {:<16} {:<10} {:<12} {}",
            t.id,
            format_done(t.done),
            format_priority(t.priority()),
            t.story_points,
            format_hours(Some(t.estimated_time)),
            if t.done { format_hours(t.actual_time) } else { "-".into() },
            format_date_limit(t.date_limit, today),
            truncate(&module_title(modules, t.module_id), 16),
            truncate(&team_name(teams, t.team_id), 10),
            truncate(&employee_name(employees, t.responsible), 12),
            t.description
        );
    }
}

/// Print every field of a single task.
pub fn print_task_detail(task: &Task, store: &LocalStore) {
    let today = Local::now().date_naive();
    let priority = task.priority();
    println!("ID:             {}", task.id);
    println!("Description:    {}", task.description);
    println!("Status:         {}", format_done(task.done));
    println!("Priority:       {} ({})", format_priority(priority), priority.color());
    println!("Story points:   {}", task.story_points);
    println!("Estimated:      {}", format_hours(Some(task.estimated_time)));
    println!("Actual:         {}", if task.done { format_hours(task.actual_time) } else { "-".into() });
    println!(
        "Date limit:     {}",
        match task.date_limit {
            Some(d) => format!("{d} ({})", format_date_limit(Some(d), today)),
            None => "-".into(),
        }
    );
    let module = task
        .module_id
        .and_then(|id| store.module(id))
        .map(Module::display_title)
        .unwrap_or_else(|| UNKNOWN_MODULE.to_string());
    let team = task
        .team_id
        .and_then(|id| store.team(id))
        .map_or("-", |t| t.name.as_str());
    println!("Module:         {module}");
    println!("Team:           {team}");
    println!("Responsible:    {}", employee_name(store.employees(), task.responsible));
}

pub fn print_module_stats(stats: &[ModuleStats]) {
    println!(
        "{:<5} {:<20} {:>6} {:>6} {:>6} {:>8} {:>8}",
        "ID", "Module", "Tasks", "Done", "%", "Hours", "Avg/task"
    );
    for s in stats {
        println!(
            "{:<5} {:<20} {:>6} {:>6} {:>5}% {:>8.1} {:>8.1}",
            s.module_id,
            truncate(&s.title, 20),
            s.total_tasks,
            s.completed_tasks,
            s.completion_pct,
            s.hours_spent,
            s.avg_time_per_task
        );
    }
}

pub fn print_time_comparison(rows: &[TimeComparison]) {
    println!("{:<20} {:>10} {:>10}", "Module", "Estimated", "Actual");
    for r in rows {
        println!(
            "{:<20} {:>9.1}h {:>9.1}h",
            truncate(&r.title, 20),
            r.estimated_hours,
            r.actual_hours
        );
    }
}

pub fn print_drilldown(d: &EmployeeDrilldown) {
    println!("Employee:         {} (#{})", d.name, d.employee_id);
    println!("Tasks completed:  {}", d.tasks_completed);
    println!("Hours worked:     {:.1}", d.hours_worked);
    println!("Progress:         {}%", d.progress_pct);
    if d.modules.is_empty() {
        println!("\nNo task history.");
        return;
    }
    println!("\nModule breakdown:");
    print_module_stats(&d.modules);
    println!("\nTime comparison:");
    print_time_comparison(&d.time);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_limit() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
        assert_eq!(format_date_limit(None, today), "-");
        assert_eq!(format_date_limit(Some(today), today), "today");
        assert_eq!(format_date_limit(today.succ_opt(), today), "tomorrow");
        assert_eq!(format_date_limit(Some(today + Duration::days(4)), today), "in 4d");
        assert_eq!(format_date_limit(Some(today - Duration::days(2)), today), "2d late");
    }

    #[test]
    fn test_parse_date_input() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date_input("today"), Some(today));
        assert_eq!(parse_date_input("in 3d"), Some(today + Duration::days(3)));
        assert_eq!(parse_date_input("in 1w"), Some(today + Duration::weeks(1)));
        assert_eq!(parse_date_input("2025-02-01"), NaiveDate::from_ymd_opt(2025, 2, 1));
        assert_eq!(parse_date_input("someday"), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer module name", 8), "a longe…");
    }
}
