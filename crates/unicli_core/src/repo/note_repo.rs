//! Standalone note repository contracts and SQLite implementation.

use crate::clock::Clock;
use crate::model::note::Note;
use crate::repo::{map_write_error, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "note";

pub trait NoteRepository {
    fn create(&self, note: &Note) -> RepoResult<()>;
    fn find_by_id(&self, id: &str) -> RepoResult<Note>;
    /// Most recently updated first.
    fn find_all(&self) -> RepoResult<Vec<Note>>;
    /// Rewrites title and content; bumps `updated_at`.
    fn update(&self, note: &mut Note) -> RepoResult<()>;
    fn delete(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
    clock: &'conn dyn Clock,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection, clock: &'conn dyn Clock) -> Self {
        Self { conn, clock }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;

        self.conn
            .execute(
                "INSERT INTO notes (id, title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    note.id,
                    note.title,
                    note.content,
                    note.created_at,
                    note.updated_at
                ],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Note> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1;",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(parse_note_row(row)?),
            None => Err(RepoError::not_found(ENTITY, id)),
        }
    }

    fn find_all(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, updated_at
             FROM notes
             ORDER BY updated_at DESC;",
        )?;
        let notes = stmt
            .query_map([], parse_note_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn update(&self, note: &mut Note) -> RepoResult<()> {
        note.validate()?;
        let updated_at = self.clock.now();

        let changed = self.conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4;",
            params![note.title, note.content, updated_at, note.id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, note.id.as_str()));
        }

        note.updated_at = updated_at;
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
