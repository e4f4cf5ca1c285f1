//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist stored calendar events.
//! - Project events (and optionally course classes) onto month, week and
//!   day windows.
//!
//! # Invariants
//! - Synthetic class events are rejected on write.
//! - A persisted recurrence rule outside the known set reads back as
//!   non-recurring instead of failing the whole query.
//! - Every projected event starts inside the requested window.

use crate::calendar::recurrence::expand_all;
use crate::calendar::window::monday_of;
use crate::calendar::ProjectionWindow;
use crate::clock::Clock;
use crate::model::event::{Event, RecurrenceRule};
use crate::repo::course_repo::CourseRepository;
use crate::repo::{map_write_error, RepoError, RepoResult};
use chrono::NaiveDate;
use log::{debug, warn};
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "event";

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    start_datetime,
    end_datetime,
    type,
    category_id,
    recurrence_rule,
    recurrence_end_date,
    created_at
FROM events";

/// Repository interface for event CRUD and windowed projection.
pub trait EventRepository {
    fn create(&self, event: &Event) -> RepoResult<()>;
    fn find_by_id(&self, id: &str) -> RepoResult<Event>;
    /// All stored events ordered by start.
    fn find_all(&self) -> RepoResult<Vec<Event>>;
    fn update(&self, event: &Event) -> RepoResult<()>;
    fn delete(&self, id: &str) -> RepoResult<()>;

    /// Stored events and their recurrences starting inside `window`.
    fn get_events_in_window(&self, window: &ProjectionWindow) -> RepoResult<Vec<Event>>;
    fn get_events_by_month(&self, year: i32, month: u32) -> RepoResult<Vec<Event>>;
    fn get_events_with_courses_for_month(
        &self,
        year: i32,
        month: u32,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>>;
    /// `week_start` is normalized to the Monday of its week.
    fn get_events_with_courses_for_week(
        &self,
        week_start: NaiveDate,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>>;
    fn get_events_with_courses_for_day(
        &self,
        date: NaiveDate,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
    clock: &'conn dyn Clock,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection, clock: &'conn dyn Clock) -> Self {
        Self { conn, clock }
    }

    fn with_classes_in_range(
        &self,
        window: &ProjectionWindow,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>> {
        let mut events = self.get_events_in_window(window)?;
        let (start, end) = (window.first_date(), window.end_date_exclusive());
        for course in courses.get_all()? {
            events.extend(
                course
                    .generate_events_for_date_range(start, end)
                    .into_iter()
                    .filter(|event| window.contains(event.start)),
            );
        }
        Ok(events)
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create(&self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        self.conn
            .execute(
                "INSERT INTO events (
                    id,
                    title,
                    description,
                    start_datetime,
                    end_datetime,
                    type,
                    category_id,
                    recurrence_rule,
                    recurrence_end_date,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    event.id,
                    event.title,
                    event.description,
                    event.start,
                    event.end,
                    event.kind,
                    event.category_id,
                    event.recurrence_rule.map(RecurrenceRule::as_str),
                    event.recurrence_end,
                    event.created_at,
                ],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;

        Ok(())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Event> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => parse_event_row(row),
            None => Err(RepoError::not_found(ENTITY, id)),
        }
    }

    fn find_all(&self) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL} ORDER BY start_datetime ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn update(&self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let changed = self.conn.execute(
            "UPDATE events
             SET
                title = ?1,
                description = ?2,
                start_datetime = ?3,
                end_datetime = ?4,
                type = ?5,
                category_id = ?6,
                recurrence_rule = ?7,
                recurrence_end_date = ?8
             WHERE id = ?9;",
            params![
                event.title,
                event.description,
                event.start,
                event.end,
                event.kind,
                event.category_id,
                event.recurrence_rule.map(RecurrenceRule::as_str),
                event.recurrence_end,
                event.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, event.id.as_str()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn get_events_in_window(&self, window: &ProjectionWindow) -> RepoResult<Vec<Event>> {
        let stored = self.find_all()?;
        let occurrences = expand_all(&stored, window, self.clock.now());
        debug!(
            "event=event_project module=repo status=ok stored={} occurrences={}",
            stored.len(),
            occurrences.len()
        );
        Ok(occurrences)
    }

    fn get_events_by_month(&self, year: i32, month: u32) -> RepoResult<Vec<Event>> {
        let window = ProjectionWindow::month(year, month)?;
        self.get_events_in_window(&window)
    }

    fn get_events_with_courses_for_month(
        &self,
        year: i32,
        month: u32,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>> {
        let window = ProjectionWindow::month(year, month)?;
        let mut events = self.get_events_in_window(&window)?;
        for course in courses.get_all()? {
            events.extend(course.generate_events_for_month(year, month));
        }
        Ok(events)
    }

    fn get_events_with_courses_for_week(
        &self,
        week_start: NaiveDate,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>> {
        let window = ProjectionWindow::week(monday_of(week_start));
        self.with_classes_in_range(&window, courses)
    }

    fn get_events_with_courses_for_day(
        &self,
        date: NaiveDate,
        courses: &dyn CourseRepository,
    ) -> RepoResult<Vec<Event>> {
        self.with_classes_in_range(&ProjectionWindow::day(date), courses)
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id: String = row.get(0)?;
    let raw_rule: Option<String> = row.get(7)?;
    let recurrence_rule = match raw_rule.as_deref().map(RecurrenceRule::parse_optional) {
        None => None,
        Some(Ok(rule)) => rule,
        Some(Err(err)) => {
            warn!(
                "event=event_read module=repo status=degraded event_id={} reason=unknown_recurrence_rule detail={}",
                id, err
            );
            None
        }
    };

    Ok(Event {
        id,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        start: row.get(3)?,
        end: row.get(4)?,
        kind: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        category_id: row.get(6)?,
        recurrence_rule,
        recurrence_end: row.get(8)?,
        created_at: row.get(9)?,
    })
}

