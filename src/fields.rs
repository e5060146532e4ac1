//! Enumerations and field types derived from task data.
//!
//! Priority is never stored on a task: it is classified from story points, which
//! double as the urgency signal. Mutation state tracks where a task sits in the
//! create/update/delete round trip against the remote API.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Story points at or above this value are high priority ("urgent").
pub const HIGH_PRIORITY_POINTS: u8 = 7;
/// Story points at or above this value (and below high) are medium priority.
pub const MEDIUM_PRIORITY_POINTS: u8 = 4;
/// Upper bound of the story point scale.
pub const MAX_STORY_POINTS: u8 = 10;
/// Soft cap for a task's estimated hours.
pub const MAX_ESTIMATED_HOURS: f64 = 4.0;

/// Priority bucket classified from story points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Classify story points: `>= 7` high, `4..=6` medium, below 4 low.
    pub fn from_story_points(points: u8) -> Self {
        if points >= HIGH_PRIORITY_POINTS {
            Priority::High
        } else if points >= MEDIUM_PRIORITY_POINTS {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Display color used for priority badges.
    pub fn color(self) -> &'static str {
        match self {
            Priority::Low => "#1F7B4D",
            Priority::Medium => "#D4A017",
            Priority::High => "#C74634",
        }
    }
}

/// Where a task is in its round trip against the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Exists only as a form submission, nothing sent yet.
    Draft,
    /// A POST or PUT is in flight.
    Submitting,
    /// Local copy matches the last confirmed remote state.
    Synced,
    /// A DELETE is in flight.
    Deleting,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Id,
    Priority,
    DateLimit,
}
