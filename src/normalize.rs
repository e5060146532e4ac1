//! Entity normalizers: raw API records into canonical entities.
//!
//! Backend record shapes have drifted between releases (`name` vs `title` on
//! modules, free-text `priority` vs numeric `story_Points` on tasks, `hoursWorked`
//! vs `numberHoursWorked` on employees). All of that is absorbed here. Every
//! function is pure and total: records that cannot be coerced are dropped with a
//! warning instead of leaking an unknown shape downstream.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::config::TeamPalette;
use crate::fields::*;
use crate::task::{Employee, Module, Recommendation, Task, Team, UserProfile};

/// First present, non-null field among `names`.
fn field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| record.get(*n))
        .find(|v| !v.is_null())
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        // References sometimes arrive as embedded objects.
        Value::Object(_) => v.get("id").and_then(as_u64),
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f: &f64| f.is_finite())
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "done" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept `YYYY-MM-DD` or any ISO date-time whose first ten characters are a date.
pub fn parse_date_limit(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// Map legacy free-text priority onto the lowest story points of its bucket.
fn story_points_from_priority_text(text: &str) -> Option<u8> {
    match text.trim().to_lowercase().as_str() {
        "high" | "alta" | "urgent" => Some(HIGH_PRIORITY_POINTS),
        "medium" | "media" => Some(MEDIUM_PRIORITY_POINTS),
        "low" | "baja" => Some(0),
        _ => None,
    }
}

fn story_points_field(record: &Value) -> Option<u8> {
    if let Some(points) = field(record, &["story_Points", "storyPoints", "story_points"]).and_then(as_u64) {
        return Some(points.min(MAX_STORY_POINTS as u64) as u8);
    }
    field(record, &["priority"])
        .and_then(Value::as_str)
        .and_then(story_points_from_priority_text)
}

fn story_points(record: &Value) -> u8 {
    story_points_field(record).unwrap_or(0)
}

/// Records of a list payload. Anything but an array yields nothing.
fn records<'a>(raw: &'a Value, what: &str) -> &'a [Value] {
    match raw {
        Value::Array(items) => items.as_slice(),
        Value::Null => &[],
        _ => {
            warn!(what, "expected a list payload, ignoring");
            &[]
        }
    }
}

pub fn normalize_module(record: &Value) -> Option<Module> {
    let id = field(record, &["id", "moduleId"]).and_then(as_u64)?;
    let title = field(record, &["title", "name"]).and_then(as_string).unwrap_or_default();
    Some(Module { id, title })
}

pub fn normalize_modules(raw: &Value) -> Vec<Module> {
    collect(records(raw, "modules"), "module", normalize_module)
}

pub fn normalize_task(record: &Value) -> Option<Task> {
    let id = field(record, &["id", "taskId"]).and_then(as_u64)?;
    let description = field(record, &["description", "title"])
        .and_then(as_string)
        .unwrap_or_default();
    let done = field(record, &["done", "completed"]).and_then(as_bool).unwrap_or(false);
    Some(Task {
        id,
        description,
        module_id: field(record, &["moduleId", "module_id", "module"]).and_then(as_u64),
        team_id: field(record, &["teamId", "team_id", "team"]).and_then(as_u64),
        responsible: field(record, &["responsible", "employeeId", "employee"]).and_then(as_u64),
        done,
        story_points: story_points(record),
        estimated_time: field(record, &["estimatedTime", "estimated_time"])
            .and_then(as_f64)
            .unwrap_or(0.0),
        actual_time: field(record, &["actualTime", "actual_time"]).and_then(as_f64),
        date_limit: field(record, &["dateLimit", "date_limit", "dueDate"])
            .and_then(Value::as_str)
            .and_then(parse_date_limit),
    })
}

/// Overlay a write reply onto the record that was submitted.
///
/// Only fields present and non-null in `reply` replace the submitted values, so
/// a partial reply (`{"id": 1, "done": true}`) keeps everything else. A blank
/// description in the reply never replaces a real one.
pub fn merge_task(mut base: Task, reply: &Value) -> Task {
    if let Some(description) = field(reply, &["description", "title"])
        .and_then(as_string)
        .filter(|d| !d.trim().is_empty())
    {
        base.description = description;
    }
    if let Some(module_id) = field(reply, &["moduleId", "module_id", "module"]).and_then(as_u64) {
        base.module_id = Some(module_id);
    }
    if let Some(team_id) = field(reply, &["teamId", "team_id", "team"]).and_then(as_u64) {
        base.team_id = Some(team_id);
    }
    if let Some(responsible) = field(reply, &["responsible", "employeeId", "employee"]).and_then(as_u64) {
        base.responsible = Some(responsible);
    }
    if let Some(done) = field(reply, &["done", "completed"]).and_then(as_bool) {
        base.done = done;
    }
    if let Some(points) = story_points_field(reply) {
        base.story_points = points;
    }
    if let Some(estimate) = field(reply, &["estimatedTime", "estimated_time"]).and_then(as_f64) {
        base.estimated_time = estimate;
    }
    if let Some(actual) = field(reply, &["actualTime", "actual_time"]).and_then(as_f64) {
        base.actual_time = Some(actual);
    }
    if let Some(date) = field(reply, &["dateLimit", "date_limit", "dueDate"])
        .and_then(Value::as_str)
        .and_then(parse_date_limit)
    {
        base.date_limit = Some(date);
    }
    base
}

/// Id carried by a write reply, if any.
pub fn reply_id(reply: &Value) -> Option<u64> {
    field(reply, &["id", "taskId"]).and_then(as_u64)
}

pub fn normalize_tasks(raw: &Value) -> Vec<Task> {
    collect(records(raw, "tasks"), "task", normalize_task)
}

pub fn normalize_team(record: &Value, palette: &TeamPalette) -> Option<Team> {
    let id = field(record, &["id", "teamId"]).and_then(as_u64)?;
    let name = field(record, &["name", "title"]).and_then(as_string).unwrap_or_default();
    let color = palette.color_for(&name).to_string();
    Some(Team { id, name, color })
}

pub fn normalize_teams(raw: &Value, palette: &TeamPalette) -> Vec<Team> {
    collect(records(raw, "teams"), "team", |r| normalize_team(r, palette))
}

fn normalize_user(record: Option<&Value>) -> UserProfile {
    let Some(user) = record else {
        return UserProfile::default();
    };
    UserProfile {
        username: field(user, &["username", "userName", "name"]).and_then(as_string).unwrap_or_default(),
        name: field(user, &["name", "fullName"]).and_then(as_string),
        phone_number: field(user, &["phoneNumber", "phone"]).and_then(as_string),
        email: field(user, &["email"]).and_then(as_string),
    }
}

pub fn normalize_employee(record: &Value) -> Option<Employee> {
    let id = field(record, &["id", "employeeId"]).and_then(as_u64)?;
    let tasks_completed = field(record, &["tasksCompleted", "tasks"])
        .map(|v| collect(records(v, "employee tasks"), "task", normalize_task))
        .unwrap_or_default();
    Some(Employee {
        id,
        user: normalize_user(field(record, &["user"])),
        role: field(record, &["role"]).and_then(as_string),
        number_tasks_completed: field(record, &["numberTasksCompleted"])
            .and_then(as_u64)
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        number_hours_worked: field(record, &["numberHoursWorked", "hoursWorked"])
            .and_then(as_f64)
            .unwrap_or(0.0),
        tasks_completed,
    })
}

pub fn normalize_employees(raw: &Value) -> Vec<Employee> {
    collect(records(raw, "employees"), "employee", normalize_employee)
}

/// A recommendation payload: an object, a one-element list, or null.
pub fn normalize_recommendation(raw: &Value) -> Option<Recommendation> {
    let record = match raw {
        Value::Array(items) => items.first()?,
        Value::Object(_) => raw,
        _ => return None,
    };
    let title = field(record, &["title", "name"]).and_then(as_string).unwrap_or_default();
    let description = field(record, &["description"]).and_then(as_string).unwrap_or_default();
    if title.trim().is_empty() && description.trim().is_empty() {
        return None;
    }
    Some(Recommendation {
        title,
        description,
        module_id: field(record, &["moduleId", "module_id", "module"]).and_then(as_u64),
        story_points: story_points(record),
        estimated_time: field(record, &["estimatedTime", "estimated_time"])
            .and_then(as_f64)
            .unwrap_or(0.0),
    })
}

fn collect<T>(items: &[Value], what: &str, f: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    items
        .iter()
        .filter_map(|record| {
            let out = f(record);
            if out.is_none() {
                warn!(what, %record, "dropping record without a usable id");
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_module_accepts_name_or_title() {
        let modules = normalize_modules(&json!([
            {"id": 1, "title": "Auth"},
            {"id": "2", "name": "Billing"},
            {"title": "orphan"}
        ]));
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0], Module { id: 1, title: "Auth".into() });
        assert_eq!(modules[1], Module { id: 2, title: "Billing".into() });
    }

    #[test]
    fn test_task_full_record() {
        let task = normalize_task(&json!({
            "id": 7,
            "description": "Login form",
            "moduleId": 1,
            "teamId": 2,
            "responsible": {"id": 5, "user": {}},
            "done": true,
            "story_Points": 8,
            "estimatedTime": 3,
            "actualTime": 2.5,
            "dateLimit": "2025-03-10T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.module_id, Some(1));
        assert_eq!(task.team_id, Some(2));
        assert_eq!(task.responsible, Some(5));
        assert!(task.done);
        assert_eq!(task.story_points, 8);
        assert_eq!(task.estimated_time, 3.0);
        assert_eq!(task.actual_time, Some(2.5));
        assert_eq!(task.date_limit, NaiveDate::from_ymd_opt(2025, 3, 10));
    }

    #[test]
    fn test_task_legacy_priority_text() {
        let task = normalize_task(&json!({"id": 1, "description": "x", "priority": "High"})).unwrap();
        assert_eq!(task.story_points, HIGH_PRIORITY_POINTS);
        assert_eq!(task.priority(), Priority::High);

        let numeric_wins = normalize_task(&json!({"id": 2, "priority": "high", "story_Points": 2})).unwrap();
        assert_eq!(numeric_wins.story_points, 2);
    }

    #[test]
    fn test_partial_reply_keeps_submitted_fields() {
        let submitted = Task {
            id: 1,
            description: "Login".into(),
            module_id: Some(2),
            team_id: Some(1),
            responsible: Some(9),
            done: true,
            story_points: 8,
            estimated_time: 3.0,
            actual_time: Some(2.5),
            date_limit: parse_date_limit("2025-03-10"),
        };
        let merged = merge_task(submitted.clone(), &json!({"id": 1, "done": true, "description": "", "moduleId": null}));
        assert_eq!(merged, submitted);

        let merged = merge_task(submitted.clone(), &json!({"id": 1, "story_Points": 4, "actualTime": "1.75"}));
        assert_eq!(merged.story_points, 4);
        assert_eq!(merged.actual_time, Some(1.75));
        assert_eq!(merged.description, "Login");
    }

    #[test]
    fn test_task_story_points_clamped() {
        let task = normalize_task(&json!({"id": 1, "story_Points": 40})).unwrap();
        assert_eq!(task.story_points, MAX_STORY_POINTS);
    }

    #[test]
    fn test_task_without_id_dropped() {
        let tasks = normalize_tasks(&json!([{"description": "no id"}, {"id": 3}]));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 3);
        assert!(!tasks[0].done);
        assert_eq!(tasks[0].actual_time, None);
    }

    #[test]
    fn test_non_list_payloads_are_empty() {
        assert!(normalize_tasks(&Value::Null).is_empty());
        assert!(normalize_tasks(&json!({"error": "nope"})).is_empty());
        assert!(normalize_modules(&json!("oops")).is_empty());
    }

    #[test]
    fn test_teams_get_palette_colors() {
        let palette = TeamPalette::default();
        let teams = normalize_teams(&json!([{"id": 1, "name": "QA"}, {"id": 2, "name": "Growth"}]), &palette);
        assert_eq!(teams[0].color, "#7D3C98");
        assert_eq!(teams[1].color, palette.fallback);
    }

    #[test]
    fn test_employee_aliases_and_embedded_tasks() {
        let employees = normalize_employees(&json!([{
            "id": 3,
            "user": {"username": "ana", "phoneNumber": "+521234"},
            "role": "developer",
            "numberTasksCompleted": 4,
            "hoursWorked": 12.5,
            "tasksCompleted": [{"id": 10, "moduleId": 1, "done": true, "actualTime": 2}]
        }]));
        let e = &employees[0];
        assert_eq!(e.display_name(), "ana");
        assert_eq!(e.user.phone_number.as_deref(), Some("+521234"));
        assert_eq!(e.number_tasks_completed, 4);
        assert_eq!(e.number_hours_worked, 12.5);
        assert_eq!(e.tasks_completed.len(), 1);
        assert_eq!(e.tasks_completed[0].actual_time, Some(2.0));
    }

    #[test]
    fn test_recommendation_shapes() {
        assert_eq!(normalize_recommendation(&Value::Null), None);
        assert_eq!(normalize_recommendation(&json!({})), None);
        let rec = normalize_recommendation(&json!([{
            "title": "Add caching",
            "description": "Cache module list",
            "moduleId": 2,
            "story_Points": 5,
            "estimatedTime": 1.5
        }]))
        .unwrap();
        assert_eq!(rec.module_id, Some(2));
        assert_eq!(rec.priority(), Priority::Medium);
    }

    #[test]
    fn test_date_limit_formats() {
        assert_eq!(parse_date_limit("2025-01-31"), NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(parse_date_limit("2025-01-31T12:00:00"), NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(parse_date_limit("31/01/2025"), None);
    }
}
