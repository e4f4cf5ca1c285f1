//! Domain validation errors and shared field checks.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static HH_MM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));
static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// Invariant violations detected before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("unknown task status `{0}`")]
    UnknownTaskStatus(String),
    #[error("unknown task priority `{0}`")]
    UnknownPriority(String),
    #[error("unknown recurrence rule `{0}`; expected none|daily|weekly|monthly")]
    UnknownRecurrenceRule(String),
    #[error("unknown attendance status `{0}`; expected present|absent|late")]
    UnknownAttendanceStatus(String),
    #[error("malformed time `{0}`; expected zero-padded HH:MM")]
    MalformedTime(String),
    #[error("day of week {0} is outside 1..=7")]
    DayOfWeekOutOfRange(i64),
    #[error("schedule start {start} must be before end {end}")]
    ScheduleTimeOrder { start: String, end: String },
    #[error("malformed color `{0}`; expected #RRGGBB")]
    InvalidColor(String),
    #[error("event end must not be earlier than its start")]
    EventEndsBeforeStart,
    #[error("month {0} is outside 1..=12")]
    InvalidMonth(u32),
    #[error("synthetic class event `{0}` cannot be persisted")]
    SyntheticEvent(String),
}

/// Rejects empty or whitespace-only values.
pub fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Accepts zero-padded 24-hour `HH:MM` strings only.
pub fn validate_hh_mm(value: &str) -> Result<(), ValidationError> {
    if HH_MM_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::MalformedTime(value.to_string()))
    }
}

/// Accepts `#RRGGBB` colors.
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(value.to_string()))
    }
}
