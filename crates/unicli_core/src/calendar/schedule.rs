//! Materialization of weekly course schedules into class events.
//!
//! # Invariants
//! - Class events are in-memory only; their `category_id` is the sentinel
//!   `course_<course id>`.
//! - Each call mints fresh ids.
//! - A slot whose times fail to parse is skipped for that call.

use crate::calendar::window::{day_of_week, first_of_month, monday_of};
use crate::model::course::{Course, CourseSchedule};
use crate::model::event::{Event, CLASS_EVENT_TYPE, COURSE_CATEGORY_PREFIX};
use crate::ids::new_id;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime};
use log::debug;

const TIME_FORMAT: &str = "%H:%M";

/// Sentinel category id for a course's class events.
pub fn course_category_id(course_id: &str) -> String {
    format!("{COURSE_CATEGORY_PREFIX}{course_id}")
}

/// One class event per slot in the week containing `week_start`.
pub fn events_for_week(course: &Course, week_start: NaiveDate) -> Vec<Event> {
    let monday = monday_of(week_start);
    course
        .schedule
        .iter()
        .filter_map(|slot| {
            let offset = slot
                .day_of_week
                .checked_sub(1)
                .and_then(|d| u64::try_from(d).ok())
                .filter(|d| *d < 7)?;
            class_event(course, slot, monday + Days::new(offset))
        })
        .collect()
}

/// Class events of every week overlapping the month, kept when they start
/// inside it.
pub fn events_for_month(course: &Course, year: i32, month: u32) -> Vec<Event> {
    let Ok(first) = first_of_month(year, month) else {
        return Vec::new();
    };
    let Some(next_first) = first.checked_add_months(Months::new(1)) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    let mut monday = monday_of(first);
    while monday < next_first {
        events.extend(
            events_for_week(course, monday)
                .into_iter()
                .filter(|event| event.start.year() == year && event.start.month() == month),
        );
        monday = monday + Days::new(7);
    }
    events
}

/// Class events for each day in `[start, end)`.
pub fn events_for_date_range(course: &Course, start: NaiveDate, end: NaiveDate) -> Vec<Event> {
    let mut events = Vec::new();
    let mut date = start;
    while date < end {
        let weekday = day_of_week(date);
        events.extend(
            course
                .schedule
                .iter()
                .filter(|slot| slot.day_of_week == weekday)
                .filter_map(|slot| class_event(course, slot, date)),
        );
        date = date + Days::new(1);
    }
    events
}

fn class_event(course: &Course, slot: &CourseSchedule, date: NaiveDate) -> Option<Event> {
    let (start, end) = match (parse_time(&slot.start_time), parse_time(&slot.end_time)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            debug!(
                "event=class_materialize module=calendar status=skipped schedule_id={} reason=unparseable_time",
                slot.id
            );
            return None;
        }
    };

    Some(Event {
        id: new_id(),
        title: course.name.clone(),
        description: class_description(course),
        start: date.and_time(start),
        end: Some(date.and_time(end)),
        kind: CLASS_EVENT_TYPE.to_string(),
        category_id: Some(course_category_id(&course.id)),
        recurrence_rule: None,
        recurrence_end: None,
        created_at: course.created_at,
    })
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

/// Code, location and professor on separate lines, blanks omitted.
fn class_description(course: &Course) -> String {
    [&course.code, &course.location, &course.professor]
        .into_iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
