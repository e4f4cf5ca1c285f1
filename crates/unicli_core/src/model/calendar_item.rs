//! Calendar projection item.
//!
//! A calendar cell shows tasks and events side by side. Both implement
//! [`CalendarEntry`]; [`CalendarItem`] is the tagged variant the projection
//! engine emits and the UI pattern-matches on.

use crate::model::event::Event;
use crate::model::task::Task;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Type tag reported by tasks placed on the calendar.
pub const TASK_ITEM_TYPE: &str = "task";

/// Shared read surface of anything placed on a calendar.
pub trait CalendarEntry {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn start(&self) -> NaiveDateTime;
    fn end(&self) -> Option<NaiveDateTime>;
    fn is_all_day(&self) -> bool;
    fn type_tag(&self) -> &str;
}

impl CalendarEntry for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    fn is_all_day(&self) -> bool {
        Event::is_all_day(self)
    }

    fn type_tag(&self) -> &str {
        &self.kind
    }
}

/// Tasks sit on their due instant; undated tasks fall back to `created_at`
/// but are never projected by the calendar engine.
impl CalendarEntry for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn start(&self) -> NaiveDateTime {
        self.due_date.unwrap_or(self.created_at)
    }

    fn end(&self) -> Option<NaiveDateTime> {
        None
    }

    /// A due date without a time of day (midnight) spans the whole day.
    fn is_all_day(&self) -> bool {
        self.due_date
            .map_or(true, |due| due.time() == NaiveTime::MIN)
    }

    fn type_tag(&self) -> &str {
        TASK_ITEM_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum CalendarItem {
    Task(Task),
    Event(Event),
}

impl CalendarItem {
    fn entry(&self) -> &dyn CalendarEntry {
        match self {
            Self::Task(task) => task,
            Self::Event(event) => event,
        }
    }
}

impl CalendarEntry for CalendarItem {
    fn id(&self) -> &str {
        self.entry().id()
    }

    fn title(&self) -> &str {
        self.entry().title()
    }

    fn start(&self) -> NaiveDateTime {
        self.entry().start()
    }

    fn end(&self) -> Option<NaiveDateTime> {
        self.entry().end()
    }

    fn is_all_day(&self) -> bool {
        self.entry().is_all_day()
    }

    fn type_tag(&self) -> &str {
        self.entry().type_tag()
    }
}

impl From<Task> for CalendarItem {
    fn from(value: Task) -> Self {
        Self::Task(value)
    }
}

impl From<Event> for CalendarItem {
    fn from(value: Event) -> Self {
        Self::Event(value)
    }
}
