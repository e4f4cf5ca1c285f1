//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks with their subtasks and tag links.
//! - Serve the kanban and agenda queries (status, due today, upcoming,
//!   overdue).
//!
//! # Invariants
//! - A task row and its tag links are written in one transaction.
//! - `completed_at` is non-null iff `status = completed` for every row this
//!   repository writes.
//! - `update` strictly increases `updated_at`.
//! - Tag rows are never deleted, even when no task references them.

use crate::clock::{start_of_day, Clock};
use crate::model::task::{Subtask, Task, TaskStatus};
use crate::model::validation::require_non_blank;
use crate::repo::{bool_to_int, map_write_error, parse_column, RepoError, RepoResult};
use chrono::{Days, Duration, NaiveDateTime};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::BTreeSet;

const ENTITY: &str = "task";
const SUBTASK_ENTITY: &str = "subtask";
const UPCOMING_DAYS: u64 = 7;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    status,
    priority,
    category,
    due_date,
    created_at,
    updated_at,
    completed_at
FROM tasks";

/// Repository interface for task CRUD and agenda queries.
pub trait TaskRepository {
    /// Inserts `task` and links its tags; stamps `completed_at` when needed.
    fn create(&self, task: &mut Task) -> RepoResult<()>;
    fn find_by_id(&self, id: &str) -> RepoResult<Task>;
    /// All tasks, newest first.
    fn find_all(&self) -> RepoResult<Vec<Task>>;
    fn find_by_status(&self, status: TaskStatus) -> RepoResult<Vec<Task>>;
    fn find_due_today(&self) -> RepoResult<Vec<Task>>;
    fn find_upcoming(&self) -> RepoResult<Vec<Task>>;
    fn find_overdue(&self) -> RepoResult<Vec<Task>>;
    /// Rewrites the row and its tag links; bumps `updated_at`.
    fn update(&self, task: &mut Task) -> RepoResult<()>;
    fn delete(&self, id: &str) -> RepoResult<()>;
    /// Flips between `completed` and `pending`.
    fn toggle_complete(&self, id: &str) -> RepoResult<Task>;
    fn create_subtask(&self, task_id: &str, title: &str) -> RepoResult<Subtask>;
    /// Persists the completion flag of `subtask`.
    fn update_subtask(&self, subtask: &Subtask) -> RepoResult<()>;
    fn delete_subtask(&self, id: i64) -> RepoResult<()>;
    fn find_subtasks(&self, task_id: &str) -> RepoResult<Vec<Subtask>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
    clock: &'conn dyn Clock,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection, clock: &'conn dyn Clock) -> Self {
        Self { conn, clock }
    }

    fn query_tasks(&self, sql: &str, params: &[&dyn ToSql]) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        for task in &mut tasks {
            self.hydrate(task)?;
        }
        debug!(
            "event=task_query module=repo status=ok rows={}",
            tasks.len()
        );
        Ok(tasks)
    }

    fn hydrate(&self, task: &mut Task) -> RepoResult<()> {
        task.tags = load_tags(self.conn, &task.id)?;
        task.subtasks = self.find_subtasks(&task.id)?;
        Ok(())
    }

    /// Strictly later than `prior`, preferring the clock.
    fn next_updated_at(&self, prior: NaiveDateTime) -> NaiveDateTime {
        let now = self.clock.now();
        if now > prior {
            now
        } else {
            prior + Duration::milliseconds(1)
        }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create(&self, task: &mut Task) -> RepoResult<()> {
        task.validate()?;
        task.reconcile_completion(self.clock.now());

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                status,
                priority,
                category,
                due_date,
                created_at,
                updated_at,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.category,
                task.due_date,
                task.created_at,
                task.updated_at,
                task.completed_at,
            ],
        )
        .map_err(|err| map_write_error(ENTITY, err))?;
        sync_tags(&tx, &task.id, &task.tags)?;
        tx.commit()?;

        Ok(())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Task> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Err(RepoError::not_found(ENTITY, id));
        };
        let mut task = parse_task_row(row)?;
        self.hydrate(&mut task)?;
        Ok(task)
    }

    fn find_all(&self) -> RepoResult<Vec<Task>> {
        self.query_tasks(&format!("{TASK_SELECT_SQL} ORDER BY created_at DESC;"), params![])
    }

    fn find_by_status(&self, status: TaskStatus) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE status = ?1 ORDER BY created_at DESC;"),
            params![status.as_str()],
        )
    }

    fn find_due_today(&self) -> RepoResult<Vec<Task>> {
        let today = self.clock.today();
        let start = start_of_day(today);
        let end = start_of_day(today + Days::new(1));
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE due_date >= ?1 AND due_date < ?2
                 ORDER BY due_date ASC;"
            ),
            params![start, end],
        )
    }

    fn find_upcoming(&self) -> RepoResult<Vec<Task>> {
        let today = self.clock.today();
        let start = start_of_day(today + Days::new(1));
        let end = start_of_day(today + Days::new(1 + UPCOMING_DAYS));
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE due_date >= ?1 AND due_date < ?2 AND status != ?3
                 ORDER BY due_date ASC;"
            ),
            params![start, end, TaskStatus::Completed.as_str()],
        )
    }

    fn find_overdue(&self) -> RepoResult<Vec<Task>> {
        let now = self.clock.now();
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE due_date IS NOT NULL AND due_date < ?1 AND status != ?2
                 ORDER BY due_date ASC;"
            ),
            params![now, TaskStatus::Completed.as_str()],
        )
    }

    fn update(&self, task: &mut Task) -> RepoResult<()> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let prior: Option<NaiveDateTime> = tx
            .query_row(
                "SELECT updated_at FROM tasks WHERE id = ?1;",
                params![task.id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(prior) = prior else {
            return Err(RepoError::not_found(ENTITY, task.id.as_str()));
        };

        let updated_at = self.next_updated_at(prior.max(task.updated_at));
        let mut next = task.clone();
        next.updated_at = updated_at;
        next.reconcile_completion(updated_at);

        tx.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                status = ?3,
                priority = ?4,
                category = ?5,
                due_date = ?6,
                updated_at = ?7,
                completed_at = ?8
             WHERE id = ?9;",
            params![
                next.title,
                next.description,
                next.status.as_str(),
                next.priority.as_str(),
                next.category,
                next.due_date,
                next.updated_at,
                next.completed_at,
                next.id,
            ],
        )?;
        sync_tags(&tx, &next.id, &next.tags)?;
        tx.commit()?;

        *task = next;
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn toggle_complete(&self, id: &str) -> RepoResult<Task> {
        let mut task = self.find_by_id(id)?;
        task.status = if task.status == TaskStatus::Completed {
            TaskStatus::Pending
        } else {
            TaskStatus::Completed
        };
        task.completed_at = None;
        self.update(&mut task)?;
        Ok(task)
    }

    fn create_subtask(&self, task_id: &str, title: &str) -> RepoResult<Subtask> {
        require_non_blank("subtask title", title)?;
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM tasks WHERE id = ?1;",
                params![task_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::not_found(ENTITY, task_id));
        }

        let created_at = self.clock.now();
        self.conn.execute(
            "INSERT INTO subtasks (task_id, title, is_completed, created_at)
             VALUES (?1, ?2, 0, ?3);",
            params![task_id, title, created_at],
        )?;

        Ok(Subtask {
            id: self.conn.last_insert_rowid(),
            task_id: task_id.to_string(),
            title: title.to_string(),
            is_completed: false,
            created_at,
        })
    }

    fn update_subtask(&self, subtask: &Subtask) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE subtasks SET is_completed = ?1 WHERE id = ?2;",
            params![bool_to_int(subtask.is_completed), subtask.id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(SUBTASK_ENTITY, subtask.id.to_string()));
        }
        Ok(())
    }

    fn delete_subtask(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM subtasks WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(RepoError::not_found(SUBTASK_ENTITY, id.to_string()));
        }
        Ok(())
    }

    fn find_subtasks(&self, task_id: &str) -> RepoResult<Vec<Subtask>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, title, is_completed, created_at
             FROM subtasks
             WHERE task_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let subtasks = stmt
            .query_map(params![task_id], |row| {
                Ok(Subtask {
                    id: row.get(0)?,
                    task_id: row.get(1)?,
                    title: row.get(2)?,
                    is_completed: row.get::<_, i64>(3)? != 0,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subtasks)
    }
}

/// Rewrites the junction rows of `task_id` to match `names`.
///
/// Must run inside the caller's transaction. Names are trimmed and
/// de-duplicated; blank names are ignored.
fn sync_tags(conn: &Connection, task_id: &str, names: &[String]) -> RepoResult<()> {
    let desired: BTreeSet<&str> = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();

    conn.execute("DELETE FROM task_tags WHERE task_id = ?1;", params![task_id])?;
    for name in &desired {
        let tag_id = ensure_tag(conn, name)?;
        conn.execute(
            "INSERT INTO task_tags (task_id, tag_id) VALUES (?1, ?2);",
            params![task_id, tag_id],
        )?;
    }

    debug!(
        "event=tag_sync module=repo status=ok links={}",
        desired.len()
    );
    Ok(())
}

fn ensure_tag(conn: &Connection, name: &str) -> RepoResult<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM tags WHERE name = ?1;",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute("INSERT INTO tags (name) VALUES (?1);", params![name])
        .map_err(|err| map_write_error("tag", err))?;
    Ok(conn.last_insert_rowid())
}

fn load_tags(conn: &Connection, task_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM tags t
         JOIN task_tags tt ON tt.tag_id = t.id
         WHERE tt.task_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let tags = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tags)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        status: parse_column("status", &status)?,
        priority: parse_column("priority", &priority)?,
        category: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        tags: Vec::new(),
        subtasks: Vec::new(),
        due_date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        completed_at: row.get(9)?,
    })
}
