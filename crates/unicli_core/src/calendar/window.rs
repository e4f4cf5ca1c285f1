//! Half-open projection windows over local time.

use crate::clock::start_of_day;
use crate::model::validation::ValidationError;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

/// `[start, end)` interval of local instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ProjectionWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// `[first of month 00:00, first of next month 00:00)`.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        let first = first_of_month(year, month)?;
        let next = first_of_next_month(first);
        Ok(Self::new(start_of_day(first), start_of_day(next)))
    }

    /// Seven days starting at the Monday of `date`'s week.
    pub fn week(date: NaiveDate) -> Self {
        let monday = monday_of(date);
        Self::new(
            start_of_day(monday),
            start_of_day(monday + Days::new(7)),
        )
    }

    /// `[date 00:00, next day 00:00)`.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(start_of_day(date), start_of_day(date + Days::new(1)))
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// First calendar date covered by the window.
    pub fn first_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// First date not covered, rounding a partial trailing day up.
    pub fn end_date_exclusive(&self) -> NaiveDate {
        let date = self.end.date();
        if self.end == start_of_day(date) {
            date
        } else {
            date + Days::new(1)
        }
    }
}

/// Day of week with Monday = 1 ... Sunday = 7.
pub fn day_of_week(date: NaiveDate) -> i64 {
    i64::from(date.weekday().number_from_monday())
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, ValidationError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(ValidationError::InvalidMonth(month))
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    // Adding one month to the 1st never clamps.
    first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}
