//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per aggregate root.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes call the entity's `validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.
//! - Multi-statement writes run inside one transaction that rolls back when
//!   dropped on an error path.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::ErrorCode;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub mod category_repo;
pub mod course_repo;
pub mod event_repo;
pub mod note_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every aggregate.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} conflicts with an existing row: {detail}")]
    Conflict { entity: &'static str, detail: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("json encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Io,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Io => "io",
        };
        f.write_str(label)
    }
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Db(_) | Self::InvalidData(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Whether `err` is a UNIQUE or PRIMARY KEY constraint failure.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Maps unique violations on `entity` writes to [`RepoError::Conflict`].
pub(crate) fn map_write_error(entity: &'static str, err: rusqlite::Error) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Conflict {
            entity,
            detail: err.to_string(),
        };
    }
    err.into()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Parses a persisted enum column, reporting unreadable values as
/// [`RepoError::InvalidData`].
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> RepoResult<T>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    raw.parse::<T>()
        .map_err(|err| RepoError::InvalidData(format!("column `{column}`: {err}")))
}
