//! Calendar projection engine.
//!
//! # Responsibility
//! - Build half-open projection windows for month/week/day views.
//! - Expand recurring events into concrete occurrences.
//! - Materialize course schedules into synthetic class events.
//!
//! # Invariants
//! - Projection never writes to the store.
//! - Expansion is bounded even for open-ended recurrences.

pub mod recurrence;
pub mod schedule;
pub mod window;

pub use window::ProjectionWindow;
