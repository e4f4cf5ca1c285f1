//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Category names are unique; a duplicate write fails with
//!   [`RepoError::Conflict`] and leaves the store unchanged.
//! - Deleting a category nulls `category_id` on referencing events.

use crate::model::category::Category;
use crate::repo::{map_write_error, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "category";

pub trait CategoryRepository {
    /// All categories ordered by name.
    fn find_all(&self) -> RepoResult<Vec<Category>>;
    fn find_by_id(&self, id: &str) -> RepoResult<Category>;
    fn create(&self, category: &Category) -> RepoResult<()>;
    fn update(&self, category: &Category) -> RepoResult<()>;
    fn delete(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories ORDER BY name ASC;")?;
        let categories = stmt
            .query_map([], parse_category_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Category> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories WHERE id = ?1;")?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(parse_category_row(row)?),
            None => Err(RepoError::not_found(ENTITY, id)),
        }
    }

    fn create(&self, category: &Category) -> RepoResult<()> {
        category.validate()?;

        self.conn
            .execute(
                "INSERT INTO categories (id, name, color) VALUES (?1, ?2, ?3);",
                params![category.id, category.name, category.color],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        Ok(())
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        category.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE categories SET name = ?1, color = ?2 WHERE id = ?3;",
                params![category.name, category.color, category.id],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, category.id.as_str()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}
