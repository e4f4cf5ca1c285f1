use unicli_core::db::migrations::{apply_migrations, latest_version, table_has_column};
use unicli_core::db::{open_db, open_db_in_memory, Database, DbError};
use rusqlite::Connection;

const TABLES: &[&str] = &[
    "tasks",
    "tags",
    "task_tags",
    "subtasks",
    "categories",
    "events",
    "courses",
    "course_schedules",
    "course_notes",
    "course_attendance",
    "grades",
    "notes",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn migrate_twice_yields_identical_schema() {
    let mut db = Database::open_in_memory().unwrap();
    let before = schema_dump(db.conn());

    db.migrate().unwrap();
    db.migrate().unwrap();

    assert_eq!(schema_dump(db.conn()), before);
    assert_eq!(db.schema_version().unwrap(), latest_version());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("unicli.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    let first_dump = schema_dump(&conn_first);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_eq!(schema_dump(&conn_second), first_dump);
}

#[test]
fn legacy_events_table_gains_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            start_datetime DATETIME NOT NULL,
            end_datetime DATETIME,
            type TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        INSERT INTO events (id, title, start_datetime, created_at)
        VALUES ('legacy-1', 'Old event', '2025-01-06 09:00:00', '2025-01-01 00:00:00');",
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    for column in ["recurrence_rule", "recurrence_end_date", "category_id"] {
        assert!(table_has_column(&conn, "events", column).unwrap(), "{column}");
    }

    // Re-running finds nothing left to add.
    apply_migrations(&mut conn).unwrap();

    let title: String = conn
        .query_row("SELECT title FROM events WHERE id = 'legacy-1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(title, "Old event");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn close_releases_file_backed_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unicli.db");

    let db = Database::open(&path).unwrap();
    db.close().unwrap();

    let reopened = Database::open(&path).unwrap();
    assert_eq!(reopened.schema_version().unwrap(), latest_version());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn schema_dump(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY type, name;")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
