//! Calendar use-case service.
//!
//! # Responsibility
//! - Compose tasks, stored events and course classes into one ordered list
//!   of [`CalendarItem`]s for a month, week or day view.
//!
//! # Invariants
//! - Every returned item starts inside the requested window.
//! - Undated tasks are never placed on the calendar.
//! - Output order: start instant, then all-day items first, then title.

use crate::calendar::window::monday_of;
use crate::calendar::ProjectionWindow;
use crate::model::calendar_item::{CalendarEntry, CalendarItem};
use crate::model::event::Event;
use crate::repo::course_repo::CourseRepository;
use crate::repo::event_repo::EventRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Use-case service building calendar views.
pub struct CalendarService<T, E, C>
where
    T: TaskRepository,
    E: EventRepository,
    C: CourseRepository,
{
    tasks: T,
    events: E,
    courses: C,
}

impl<T, E, C> CalendarService<T, E, C>
where
    T: TaskRepository,
    E: EventRepository,
    C: CourseRepository,
{
    pub fn new(tasks: T, events: E, courses: C) -> Self {
        Self {
            tasks,
            events,
            courses,
        }
    }

    pub fn month_items(&self, year: i32, month: u32) -> RepoResult<Vec<CalendarItem>> {
        let window = ProjectionWindow::month(year, month)?;
        let events = self
            .events
            .get_events_with_courses_for_month(year, month, &self.courses)?;
        self.assemble(&window, events)
    }

    /// Items of the Monday-based week containing `date`.
    pub fn week_items(&self, date: NaiveDate) -> RepoResult<Vec<CalendarItem>> {
        let monday = monday_of(date);
        let window = ProjectionWindow::week(monday);
        let events = self
            .events
            .get_events_with_courses_for_week(monday, &self.courses)?;
        self.assemble(&window, events)
    }

    pub fn day_items(&self, date: NaiveDate) -> RepoResult<Vec<CalendarItem>> {
        let window = ProjectionWindow::day(date);
        let events = self
            .events
            .get_events_with_courses_for_day(date, &self.courses)?;
        self.assemble(&window, events)
    }

    fn assemble(
        &self,
        window: &ProjectionWindow,
        events: Vec<Event>,
    ) -> RepoResult<Vec<CalendarItem>> {
        let mut items: Vec<CalendarItem> = events.into_iter().map(CalendarItem::from).collect();
        items.extend(
            self.tasks
                .find_all()?
                .into_iter()
                .filter(|task| task.due_date.is_some_and(|due| window.contains(due)))
                .map(CalendarItem::from),
        );
        sort_items(&mut items);
        Ok(items)
    }
}

/// Sorts by start instant, all-day items first, then title.
pub fn sort_items(items: &mut [CalendarItem]) {
    items.sort_by(compare_items);
}

fn compare_items(a: &CalendarItem, b: &CalendarItem) -> Ordering {
    a.start()
        .cmp(&b.start())
        .then_with(|| b.is_all_day().cmp(&a.is_all_day()))
        .then_with(|| a.title().cmp(b.title()))
}
