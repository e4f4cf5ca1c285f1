//! Task and subtask domain model.
//!
//! # Responsibility
//! - Define task lifecycle enums and the task/subtask records.
//! - Own derived predicates (overdue, due today, completion) and the
//!   display ordering exported to the UI.
//!
//! # Invariants
//! - `completed_at` is set iff `status == Completed`.
//! - `priority` defaults to `Medium`.
//! - Every predicate is a pure function of the task and the given instant.

use crate::clock::start_of_day;
use crate::ids::new_id;
use crate::model::validation::{require_non_blank, ValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::UnknownTaskStatus(other.to_string())),
        }
    }
}

/// Task urgency. Variant order is ascending urgency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl Display for TaskPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// One checklist item owned by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Assigned by the store on insert.
    pub id: i64,
    pub task_id: String,
    pub title: String,
    pub is_completed: bool,
    pub created_at: NaiveDateTime,
}

/// Actionable item shown on the kanban board and folded into calendars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Free-form label; unrelated to managed categories.
    pub category: String,
    /// Tag names; the store owns their integer ids.
    pub tags: Vec<String>,
    pub subtasks: Vec<Subtask>,
    pub due_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Task {
    /// Creates a pending, medium-priority task stamped at `now`.
    pub fn new(title: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            category: String::new(),
            tags: Vec::new(),
            subtasks: Vec::new(),
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("task id", &self.id)?;
        require_non_blank("task title", &self.title)
    }

    /// Brings `completed_at` in line with `status`.
    ///
    /// Entering `Completed` without a stamp records `now`; any other status
    /// clears the stamp.
    pub fn reconcile_completion(&mut self, now: NaiveDateTime) {
        if self.status == TaskStatus::Completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }

    /// Overdue: has a due date before the start of `now`'s day and is not
    /// completed.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            Some(due) if self.status != TaskStatus::Completed => due < start_of_day(now.date()),
            _ => false,
        }
    }

    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due.date() == today)
    }

    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|st| st.is_completed).count()
    }

    /// Integer percent of completed subtasks, rounded down; 0 without subtasks.
    pub fn completion_percentage(&self) -> u8 {
        let total = self.subtasks.len();
        if total == 0 {
            return 0;
        }
        // completed <= total, so the quotient is at most 100.
        (self.completed_subtasks() * 100 / total) as u8
    }

    /// `"(k/n)"`, or empty without subtasks.
    pub fn completion_ratio(&self) -> String {
        if self.subtasks.is_empty() {
            return String::new();
        }
        format!("({}/{})", self.completed_subtasks(), self.subtasks.len())
    }
}

/// Orders two tasks for display.
///
/// Overdue first, then higher priority, then dated before undated (earlier
/// dates first), then older `created_at` first.
pub fn display_order(a: &Task, b: &Task, now: NaiveDateTime) -> Ordering {
    b.is_overdue(now)
        .cmp(&a.is_overdue(now))
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Sorts tasks in place using [`display_order`].
pub fn sort_for_display(tasks: &mut [Task], now: NaiveDateTime) {
    tasks.sort_by(|a, b| display_order(a, b, now));
}
