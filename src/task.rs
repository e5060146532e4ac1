//! Canonical entity shapes: tasks, modules, teams, employees and recommendations.
//!
//! Field names serialize the way the remote list API spells them (`moduleId`,
//! `story_Points`, `estimatedTime`, ...), so the same structs are used for request
//! bodies and for the local snapshot cache. Raw API records never reach these
//! types directly; they pass through [`crate::normalize`] first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ValidationGap;
use crate::fields::*;

/// A unit of work belonging to a module and a team.
///
/// `actual_time` only carries meaning while `done` is true. Priority is derived
/// from `story_points` and is independent of `estimated_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub module_id: Option<u64>,
    pub team_id: Option<u64>,
    pub responsible: Option<u64>,
    #[serde(default)]
    pub done: bool,
    #[serde(rename = "story_Points", default)]
    pub story_points: u8,
    #[serde(default)]
    pub estimated_time: f64,
    #[serde(default)]
    pub actual_time: Option<f64>,
    #[serde(default)]
    pub date_limit: Option<NaiveDate>,
}

impl Task {
    pub fn priority(&self) -> Priority {
        Priority::from_story_points(self.story_points)
    }

    pub fn is_urgent(&self) -> bool {
        self.story_points >= HIGH_PRIORITY_POINTS
    }

    /// Hours counted toward KPIs: the actual time of a completed task, otherwise zero.
    pub fn hours_spent(&self) -> f64 {
        if self.done {
            self.actual_time.unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Request body for `PUT todolist/{id}`.
    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Check the fields a form would require before a PUT.
    pub fn validate(&self) -> Result<(), ValidationGap> {
        check_description(&self.description)?;
        check_story_points(self.story_points)?;
        if self.estimated_time < 0.0 {
            return Err(ValidationGap::NegativeEstimate(self.estimated_time));
        }
        if let Some(actual) = self.actual_time {
            check_actual_time(actual)?;
        }
        Ok(())
    }
}

/// A task as submitted from the create form, before the backend assigns an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub module_id: Option<u64>,
    pub team_id: Option<u64>,
    pub responsible: Option<u64>,
    pub story_points: u8,
    pub estimated_time: f64,
    pub date_limit: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        NewTask {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Validate the draft and apply the soft cap on estimated hours.
    pub fn validated(mut self) -> Result<Self, ValidationGap> {
        check_description(&self.description)?;
        check_story_points(self.story_points)?;
        self.estimated_time = cap_estimate(self.estimated_time)?;
        self.description = self.description.trim().to_string();
        Ok(self)
    }

    /// The pending task this draft becomes once the backend assigns `id`.
    pub fn into_task(self, id: u64) -> Task {
        Task {
            id,
            description: self.description,
            module_id: self.module_id,
            team_id: self.team_id,
            responsible: self.responsible,
            done: false,
            story_points: self.story_points,
            estimated_time: self.estimated_time,
            actual_time: None,
            date_limit: self.date_limit,
        }
    }

    /// Request body for `POST todolist`. Carries no id.
    pub fn to_body(&self) -> Value {
        json!({
            "description": self.description,
            "moduleId": self.module_id,
            "teamId": self.team_id,
            "responsible": self.responsible,
            "done": false,
            "story_Points": self.story_points,
            "estimatedTime": self.estimated_time,
            "actualTime": null,
            "dateLimit": self.date_limit,
        })
    }
}

/// Field edits for an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub module_id: Option<u64>,
    pub team_id: Option<u64>,
    pub responsible: Option<u64>,
    pub story_points: Option<u8>,
    pub estimated_time: Option<f64>,
    pub date_limit: Option<NaiveDate>,
    pub clear_date_limit: bool,
    pub clear_responsible: bool,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }

    /// Produce the edited copy of `task`, validated and with the estimate capped.
    pub fn apply(&self, task: &Task) -> Result<Task, ValidationGap> {
        let mut t = task.clone();
        if let Some(d) = &self.description {
            t.description = d.trim().to_string();
        }
        if let Some(m) = self.module_id {
            t.module_id = Some(m);
        }
        if let Some(team) = self.team_id {
            t.team_id = Some(team);
        }
        if self.clear_responsible {
            t.responsible = None;
        }
        if let Some(r) = self.responsible {
            t.responsible = Some(r);
        }
        if let Some(sp) = self.story_points {
            t.story_points = sp;
        }
        if let Some(est) = self.estimated_time {
            t.estimated_time = cap_estimate(est)?;
        }
        if self.clear_date_limit {
            t.date_limit = None;
        }
        if let Some(d) = self.date_limit {
            t.date_limit = Some(d);
        }
        t.validate()?;
        Ok(t)
    }
}

/// A named grouping of tasks, such as a project phase or feature area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    pub title: String,
}

impl Module {
    /// Title for display, falling back to `Module {id}` when the backend sent none.
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Module {}", self.id)
        } else {
            self.title.clone()
        }
    }
}

/// Synthetic title shown for tasks whose module is not in the collection.
pub const UNKNOWN_MODULE: &str = "Unknown module";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub color: String,
}

/// The user account behind an employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// A team member with counters maintained by the employees API.
///
/// `number_tasks_completed` and `number_hours_worked` are authoritative and are
/// never recomputed from the task list. `tasks_completed` feeds drill-down views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: u64,
    pub user: UserProfile,
    pub role: Option<String>,
    pub number_tasks_completed: u32,
    pub number_hours_worked: f64,
    pub tasks_completed: Vec<Task>,
}

impl Employee {
    pub fn display_name(&self) -> &str {
        if !self.user.username.is_empty() {
            &self.user.username
        } else {
            self.user.name.as_deref().unwrap_or("-")
        }
    }
}

/// A suggested next task. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub module_id: Option<u64>,
    #[serde(rename = "story_Points")]
    pub story_points: u8,
    pub estimated_time: f64,
}

impl Recommendation {
    pub fn priority(&self) -> Priority {
        Priority::from_story_points(self.story_points)
    }
}

fn check_description(description: &str) -> Result<(), ValidationGap> {
    if description.trim().is_empty() {
        return Err(ValidationGap::MissingDescription);
    }
    Ok(())
}

fn check_story_points(points: u8) -> Result<(), ValidationGap> {
    if points > MAX_STORY_POINTS {
        return Err(ValidationGap::StoryPointsOutOfRange(points));
    }
    Ok(())
}

/// Validate an hours value supplied when completing a task.
pub fn check_actual_time(hours: f64) -> Result<(), ValidationGap> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ValidationGap::InvalidActualTime(hours));
    }
    Ok(())
}

fn cap_estimate(hours: f64) -> Result<f64, ValidationGap> {
    if hours < 0.0 || hours.is_nan() {
        return Err(ValidationGap::NegativeEstimate(hours));
    }
    if hours > MAX_ESTIMATED_HOURS {
        tracing::warn!(hours, cap = MAX_ESTIMATED_HOURS, "estimated time above soft cap, clamping");
        return Ok(MAX_ESTIMATED_HOURS);
    }
    Ok(hours)
}
