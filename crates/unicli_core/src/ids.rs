//! Identifier minting for stored entities.
//!
//! # Invariants
//! - Identifiers are random (v4) UUIDs rendered in 36-character hyphenated
//!   form; they never derive from the clock.
//! - Subtask and tag ids are integers assigned by the store and are not
//!   minted here.

use uuid::Uuid;

/// Length of a rendered identifier.
pub const ID_LEN: usize = 36;

/// Mints a new opaque identifier.
pub fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
