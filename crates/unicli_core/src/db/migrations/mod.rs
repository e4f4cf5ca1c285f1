//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register versioned schema migrations in strictly increasing order.
//! - Apply additive column migrations for stores created by older builds.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Additive migrations only ever add missing columns; nothing is dropped.
//! - `apply_migrations` is idempotent and safe to run on every start.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

/// Column that may be missing from tables created by older builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdditiveColumn {
    pub table: &'static str,
    pub column: &'static str,
    pub sql_type: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Historical column additions, checked on every start.
pub const ADDITIVE_COLUMNS: &[AdditiveColumn] = &[
    AdditiveColumn {
        table: "events",
        column: "recurrence_rule",
        sql_type: "TEXT",
    },
    AdditiveColumn {
        table: "events",
        column: "recurrence_end_date",
        sql_type: "DATETIME",
    },
    AdditiveColumn {
        table: "events",
        column: "category_id",
        sql_type: "TEXT",
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies pending versioned migrations, then any missing additive columns.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={}",
            migration.version
        );
    }

    for column in ADDITIVE_COLUMNS {
        if add_column_if_missing(&tx, column)? {
            info!(
                "event=db_add_column module=db status=ok table={} column={}",
                column.table, column.column
            );
        }
    }
    tx.commit()?;

    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Returns whether `table` currently has `column`.
pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn add_column_if_missing(conn: &Connection, column: &AdditiveColumn) -> DbResult<bool> {
    if table_has_column(conn, column.table, column.column)? {
        return Ok(false);
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        column.table, column.column, column.sql_type
    ))?;
    Ok(true)
}
