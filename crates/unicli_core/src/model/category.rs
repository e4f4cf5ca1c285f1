//! Managed event category.

use crate::ids::new_id;
use crate::model::validation::{require_non_blank, validate_hex_color, ValidationError};
use serde::{Deserialize, Serialize};

/// Named color bucket referenced by events. Names are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// `#RRGGBB`.
    pub color: String,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("category id", &self.id)?;
        require_non_blank("category name", &self.name)?;
        validate_hex_color(&self.color)
    }
}
