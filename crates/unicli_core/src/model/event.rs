//! Calendar event domain model.
//!
//! # Responsibility
//! - Define stored events and their recurrence rule.
//! - Mark synthetic class events so they are never persisted.
//!
//! # Invariants
//! - `end`, when present, is not earlier than `start`.
//! - `category_id` values starting with [`COURSE_CATEGORY_PREFIX`] only
//!   appear on in-memory class events.

use crate::ids::new_id;
use crate::model::validation::{require_non_blank, ValidationError};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Prefix of the sentinel `category_id` carried by class events.
pub const COURSE_CATEGORY_PREFIX: &str = "course_";

/// Default `type` for user-created events.
pub const DEFAULT_EVENT_TYPE: &str = "event";

/// `type` of events materialized from course schedules.
pub const CLASS_EVENT_TYPE: &str = "class";

/// Repetition period for recurring events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses user input where blank and `"none"` mean "does not repeat".
    pub fn parse_optional(value: &str) -> Result<Option<Self>, ValidationError> {
        match value.trim() {
            "" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl Display for RecurrenceRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceRule {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ValidationError::UnknownRecurrenceRule(other.to_string())),
        }
    }
}

/// Stored or synthetic calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    /// Serialized as `type`, e.g. `event`, `meeting`, `class`.
    #[serde(rename = "type")]
    pub kind: String,
    pub category_id: Option<String>,
    pub recurrence_rule: Option<RecurrenceRule>,
    /// Last instant (inclusive) an occurrence may start at.
    pub recurrence_end: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Event {
    /// Creates a one-off event of type `event` stamped at `now`.
    pub fn new(title: impl Into<String>, start: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: String::new(),
            start,
            end: None,
            kind: DEFAULT_EVENT_TYPE.to_string(),
            category_id: None,
            recurrence_rule: None,
            recurrence_end: None,
            created_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("event id", &self.id)?;
        require_non_blank("event title", &self.title)?;
        if self.end.is_some_and(|end| end < self.start) {
            return Err(ValidationError::EventEndsBeforeStart);
        }
        if self.is_synthetic() {
            return Err(ValidationError::SyntheticEvent(self.id.clone()));
        }
        Ok(())
    }

    /// Whether this event was materialized from a course schedule.
    pub fn is_synthetic(&self) -> bool {
        self.category_id
            .as_deref()
            .is_some_and(|id| id.starts_with(COURSE_CATEGORY_PREFIX))
    }

    /// Course id encoded in a class event's sentinel category.
    pub fn course_id(&self) -> Option<&str> {
        self.category_id
            .as_deref()
            .and_then(|id| id.strip_prefix(COURSE_CATEGORY_PREFIX))
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    /// All-day: open-ended, or a midnight start spanning exactly 24 hours.
    pub fn is_all_day(&self) -> bool {
        match self.duration() {
            None => true,
            Some(span) => self.start.time() == NaiveTime::MIN && span == Duration::hours(24),
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }
}
