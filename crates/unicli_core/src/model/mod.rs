//! Domain model for the student organizer.
//!
//! # Responsibility
//! - Define entities (tasks, events, categories, courses, notes) and the
//!   calendar item variant used by projections.
//! - Own entity invariants and derived predicates.
//!
//! # Invariants
//! - Entities validate themselves; repositories call `validate()` before
//!   every write.
//! - Optional attributes are `Option` here and `NULL` in storage.

pub mod calendar_item;
pub mod category;
pub mod course;
pub mod event;
pub mod note;
pub mod task;
pub mod validation;
