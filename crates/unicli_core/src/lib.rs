//! Domain and persistence core of the unicli student organizer.
//! This crate is the single source of truth for business invariants.

pub mod calendar;
pub mod clock;
pub mod config;
pub mod db;
pub mod ids;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::ProjectionWindow;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{Database, DbError, DbResult};
pub use ids::new_id;
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
};
pub use model::calendar_item::{CalendarEntry, CalendarItem};
pub use model::category::Category;
pub use model::course::{
    weighted_average, AttendanceStatus, Course, CourseAttendance, CourseNote, CourseSchedule,
    Grade,
};
pub use model::event::{Event, RecurrenceRule};
pub use model::note::Note;
pub use model::task::{sort_for_display, Subtask, Task, TaskPriority, TaskStatus};
pub use model::validation::ValidationError;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::course_repo::{CourseRepository, SqliteCourseRepository};
pub use repo::event_repo::{EventRepository, SqliteEventRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{ErrorKind, RepoError, RepoResult};
pub use service::calendar_service::CalendarService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
