//! Recurrence expansion of stored events into window occurrences.
//!
//! # Invariants
//! - One-off events are emitted unchanged iff their start is in the window.
//! - Every occurrence of a recurring event gets a fresh id and keeps the
//!   parent's duration.
//! - The walk stops at `recurrence_end` (inclusive) or, without one, at
//!   `now` plus [`HORIZON_MONTHS`]; it never passes the window end.
//! - Without `recurrence_end`, the first instance is emitted even when it
//!   starts past the horizon.
//! - Monthly steps use overflowing calendar arithmetic: Jan 31 + 1 month is
//!   Mar 3 (Feb 1 + 30 days), not a clamped Feb 28.

use crate::calendar::window::ProjectionWindow;
use crate::ids::new_id;
use crate::model::event::{Event, RecurrenceRule};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

/// Walk cap for open-ended recurrences.
pub const HORIZON_MONTHS: u32 = 24;

/// Adds `months` to `instant`, rolling surplus days into the next month.
pub fn add_months_overflowing(instant: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    let month_index = instant.year() * 12 + i32::try_from(instant.month0()).ok()?;
    let target = month_index.checked_add(i32::try_from(months).ok()?)?;
    let year = target.div_euclid(12);
    let month = u32::try_from(target.rem_euclid(12)).ok()? + 1;
    let date = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(instant.day() - 1)))?;
    Some(date.and_time(instant.time()))
}

/// Next occurrence start after `instant`.
pub fn step(instant: NaiveDateTime, rule: RecurrenceRule) -> Option<NaiveDateTime> {
    match rule {
        RecurrenceRule::Daily => instant.checked_add_days(Days::new(1)),
        RecurrenceRule::Weekly => instant.checked_add_days(Days::new(7)),
        RecurrenceRule::Monthly => add_months_overflowing(instant, 1),
    }
}

/// Last instant an open-ended recurrence is walked to.
pub fn horizon(now: NaiveDateTime) -> NaiveDateTime {
    add_months_overflowing(now, HORIZON_MONTHS).unwrap_or(NaiveDateTime::MAX)
}

/// Occurrences of `event` whose start lies in `window`.
pub fn expand(event: &Event, window: &ProjectionWindow, now: NaiveDateTime) -> Vec<Event> {
    let Some(rule) = event.recurrence_rule else {
        return if window.contains(event.start) {
            vec![event.clone()]
        } else {
            Vec::new()
        };
    };

    let limit = event
        .recurrence_end
        .unwrap_or_else(|| horizon(now).max(event.start));
    let duration = event.duration();
    let mut occurrences = Vec::new();
    let mut current = event.start;

    while current <= limit && current < window.end {
        if window.contains(current) {
            let mut occurrence = event.clone();
            occurrence.id = new_id();
            occurrence.start = current;
            occurrence.end = duration.map(|span| current + span);
            occurrences.push(occurrence);
        }
        match step(current, rule) {
            Some(next) => current = next,
            None => break,
        }
    }

    occurrences
}

/// Expands every event; output order follows input order.
pub fn expand_all<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    window: &ProjectionWindow,
    now: NaiveDateTime,
) -> Vec<Event> {
    events
        .into_iter()
        .flat_map(|event| expand(event, window, now))
        .collect()
}
