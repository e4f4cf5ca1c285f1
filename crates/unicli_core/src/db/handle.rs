//! Process-wide store handle.
//!
//! # Responsibility
//! - Own the single SQLite connection and the injected clock.
//! - Hand out repositories that borrow both.
//!
//! # Invariants
//! - The connection is bootstrapped (pragmas + migrations) before any
//!   repository can be obtained.

use super::migrations::{apply_migrations, current_user_version};
use super::{open_db, open_db_in_memory, DbError, DbResult};
use crate::clock::{Clock, SystemClock};
use crate::repo::category_repo::SqliteCategoryRepository;
use crate::repo::course_repo::SqliteCourseRepository;
use crate::repo::event_repo::SqliteEventRepository;
use crate::repo::note_repo::SqliteNoteRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use log::info;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub struct Database {
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl Database {
    /// Opens (or creates) the store at `path` with the system clock.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already bootstrapped connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used by every repository handed out afterwards.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn tasks(&self) -> SqliteTaskRepository<'_> {
        SqliteTaskRepository::new(&self.conn, self.clock.as_ref())
    }

    pub fn events(&self) -> SqliteEventRepository<'_> {
        SqliteEventRepository::new(&self.conn, self.clock.as_ref())
    }

    pub fn categories(&self) -> SqliteCategoryRepository<'_> {
        SqliteCategoryRepository::new(&self.conn)
    }

    pub fn courses(&self) -> SqliteCourseRepository<'_> {
        SqliteCourseRepository::new(&self.conn, self.clock.as_ref())
    }

    pub fn notes(&self) -> SqliteNoteRepository<'_> {
        SqliteNoteRepository::new(&self.conn, self.clock.as_ref())
    }

    /// Re-runs migrations; a no-op on an up-to-date store.
    pub fn migrate(&mut self) -> DbResult<()> {
        apply_migrations(&mut self.conn)
    }

    pub fn schema_version(&self) -> DbResult<u32> {
        current_user_version(&self.conn)
    }

    /// Releases the connection, surfacing any close failure.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))?;
        info!("event=db_close module=db status=ok");
        Ok(())
    }
}
