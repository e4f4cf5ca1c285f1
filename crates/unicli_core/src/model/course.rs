//! Course aggregate: course, weekly schedule, notes, attendance and grades.
//!
//! # Responsibility
//! - Define academic course records and their dependent rows.
//! - Expose schedule materialization entry points (see `calendar::schedule`).
//!
//! # Invariants
//! - `day_of_week` uses Monday = 1 ... Sunday = 7.
//! - Schedule times are zero-padded `HH:MM` with `start_time < end_time`.
//! - Dependent rows are owned by the course and deleted with it.

use crate::calendar::schedule;
use crate::ids::new_id;
use crate::model::event::Event;
use crate::model::validation::{require_non_blank, validate_hh_mm, ValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const DAY_SHORT_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Academic course with its weekly class schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    /// e.g. "Calculus I".
    pub name: String,
    /// e.g. "MATH 101".
    pub code: String,
    pub professor: String,
    pub location: String,
    /// e.g. "Fall 2025".
    pub semester: String,
    pub credits: i64,
    /// Calendar color.
    pub color: String,
    pub description: String,
    pub schedule: Vec<CourseSchedule>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Course {
    pub fn new(name: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            code: String::new(),
            professor: String::new(),
            location: String::new(),
            semester: String::new(),
            credits: 0,
            color: String::new(),
            description: String::new(),
            schedule: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a weekly slot owned by this course.
    pub fn add_schedule(
        &mut self,
        day_of_week: i64,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        now: NaiveDateTime,
    ) -> &mut Self {
        let slot = CourseSchedule::new(self.id.clone(), day_of_week, start_time, end_time, now);
        self.schedule.push(slot);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("course id", &self.id)?;
        require_non_blank("course name", &self.name)?;
        self.schedule.iter().try_for_each(CourseSchedule::validate)
    }

    /// Class events for the week containing `week_start`.
    pub fn generate_events_for_week(&self, week_start: NaiveDate) -> Vec<Event> {
        schedule::events_for_week(self, week_start)
    }

    /// Class events starting within `month` of `year`.
    pub fn generate_events_for_month(&self, year: i32, month: u32) -> Vec<Event> {
        schedule::events_for_month(self, year, month)
    }

    /// Class events for every day in `[start, end)`.
    pub fn generate_events_for_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Event> {
        schedule::events_for_date_range(self, start, end)
    }
}

/// One weekly class slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSchedule {
    pub id: String,
    pub course_id: String,
    /// 1 = Monday ... 7 = Sunday.
    pub day_of_week: i64,
    /// `HH:MM`.
    pub start_time: String,
    /// `HH:MM`.
    pub end_time: String,
    pub created_at: NaiveDateTime,
}

impl CourseSchedule {
    pub fn new(
        course_id: impl Into<String>,
        day_of_week: i64,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            course_id: course_id.into(),
            day_of_week,
            start_time: start_time.into(),
            end_time: end_time.into(),
            created_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=7).contains(&self.day_of_week) {
            return Err(ValidationError::DayOfWeekOutOfRange(self.day_of_week));
        }
        validate_hh_mm(&self.start_time)?;
        validate_hh_mm(&self.end_time)?;
        // Zero-padded HH:MM compares correctly as text.
        if self.start_time >= self.end_time {
            return Err(ValidationError::ScheduleTimeOrder {
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }
        Ok(())
    }

    /// "Monday" ... "Sunday"; empty outside 1..=7.
    pub fn day_name(&self) -> &'static str {
        day_index(self.day_of_week).map_or("", |idx| DAY_NAMES[idx])
    }

    /// "Mon" ... "Sun"; empty outside 1..=7.
    pub fn day_short(&self) -> &'static str {
        day_index(self.day_of_week).map_or("", |idx| DAY_SHORT_NAMES[idx])
    }
}

fn day_index(day_of_week: i64) -> Option<usize> {
    if (1..=7).contains(&day_of_week) {
        usize::try_from(day_of_week - 1).ok()
    } else {
        None
    }
}

/// Markdown note attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseNote {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub content: String,
    pub date: NaiveDateTime,
    /// Stored as a JSON array string.
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CourseNote {
    pub fn new(
        course_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            course_id: course_id.into(),
            title: title.into(),
            content: content.into(),
            date: now,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("note title", &self.title)
    }
}

/// Attendance outcome of one class session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

impl Display for AttendanceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            other => Err(ValidationError::UnknownAttendanceStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAttendance {
    pub id: String,
    pub course_id: String,
    pub date: NaiveDateTime,
    pub status: AttendanceStatus,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

impl CourseAttendance {
    pub fn new(
        course_id: impl Into<String>,
        date: NaiveDateTime,
        status: AttendanceStatus,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            course_id: course_id.into(),
            date,
            status,
            notes: String::new(),
            created_at: now,
        }
    }
}

/// Scored assessment within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub score: f64,
    pub max_score: f64,
    /// Defaults to 1.0.
    pub weight: f64,
    pub date: Option<NaiveDate>,
    /// Serialized as `type`, e.g. "exam", "homework".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Grade {
    pub fn new(
        course_id: impl Into<String>,
        name: impl Into<String>,
        score: f64,
        max_score: f64,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            course_id: course_id.into(),
            name: name.into(),
            score,
            max_score,
            weight: 1.0,
            date: None,
            kind: None,
            created_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("grade name", &self.name)
    }

    /// Score as a percentage of `max_score`; `None` when `max_score` is not
    /// positive.
    pub fn percentage(&self) -> Option<f64> {
        if self.max_score > 0.0 {
            Some(self.score / self.max_score * 100.0)
        } else {
            None
        }
    }
}

/// Weight-averaged percentage over gradable entries.
///
/// Entries without a percentage are skipped. Returns `None` when the
/// remaining total weight is zero.
pub fn weighted_average(grades: &[Grade]) -> Option<f64> {
    let (sum, weight) = grades
        .iter()
        .filter_map(|grade| grade.percentage().map(|pct| (pct, grade.weight)))
        .fold((0.0, 0.0), |(sum, total), (pct, weight)| {
            (sum + pct * weight, total + weight)
        });
    if weight > 0.0 {
        Some(sum / weight)
    } else {
        None
    }
}
