//! Wall-clock abstraction.
//!
//! # Responsibility
//! - Provide "now" and "today" to repositories and calendar projection.
//! - Allow tests to pin time with [`FixedClock`].
//!
//! # Invariants
//! - All instants are local wall-clock values without a zone.
//! - `today()` is `now()` truncated to local midnight.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Mutex;

/// Source of the current local instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Pins the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.lock() = now;
    }

    /// Moves the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let mut guard = self.lock();
        *guard += step;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}

/// Returns local midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
