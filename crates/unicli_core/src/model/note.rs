//! Free-standing note, not attached to any course.

use crate::ids::new_id;
use crate::model::validation::{require_non_blank, ValidationError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("note id", &self.id)?;
        require_non_blank("note title", &self.title)
    }
}
