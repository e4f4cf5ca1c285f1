//! Course repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist courses together with their weekly schedule.
//! - Persist dependent notes, attendance and grades.
//!
//! # Invariants
//! - A course row and its schedule rows are written in one transaction;
//!   update replaces the whole schedule.
//! - Deleting a course cascades to schedules, notes, attendance and grades.
//! - Course-note tags are stored as a JSON string array.

use crate::clock::Clock;
use crate::model::course::{Course, CourseAttendance, CourseNote, CourseSchedule, Grade};
use crate::repo::{map_write_error, parse_column, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row, ToSql};

const ENTITY: &str = "course";

const COURSE_SELECT_SQL: &str = "SELECT
    id,
    name,
    code,
    professor,
    location,
    semester,
    credits,
    color,
    description,
    created_at,
    updated_at
FROM courses";

pub trait CourseRepository {
    /// Inserts the course and each attached schedule slot; slots are
    /// re-pointed at `course.id`.
    fn create(&self, course: &mut Course) -> RepoResult<()>;
    /// Rewrites the course row and replaces its schedule; bumps `updated_at`.
    fn update(&self, course: &mut Course) -> RepoResult<()>;
    fn delete(&self, id: &str) -> RepoResult<()>;
    fn get_by_id(&self, id: &str) -> RepoResult<Course>;
    /// All courses ordered by name, schedules loaded.
    fn get_all(&self) -> RepoResult<Vec<Course>>;
    fn get_by_semester(&self, semester: &str) -> RepoResult<Vec<Course>>;
    /// Slots ordered by weekday, then start time.
    fn get_schedules(&self, course_id: &str) -> RepoResult<Vec<CourseSchedule>>;

    fn create_note(&self, note: &CourseNote) -> RepoResult<()>;
    /// Newest date first.
    fn get_notes(&self, course_id: &str) -> RepoResult<Vec<CourseNote>>;
    fn create_attendance(&self, attendance: &CourseAttendance) -> RepoResult<()>;
    /// Newest date first.
    fn get_attendance(&self, course_id: &str) -> RepoResult<Vec<CourseAttendance>>;
    fn create_grade(&self, grade: &Grade) -> RepoResult<()>;
    /// Newest date first, undated grades last.
    fn get_grades(&self, course_id: &str) -> RepoResult<Vec<Grade>>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
    clock: &'conn dyn Clock,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn new(conn: &'conn Connection, clock: &'conn dyn Clock) -> Self {
        Self { conn, clock }
    }

    fn query_courses(&self, sql: &str, params: &[&dyn ToSql]) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut courses = stmt
            .query_map(params, parse_course_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for course in &mut courses {
            course.schedule = self.get_schedules(&course.id)?;
        }
        debug!(
            "event=course_query module=repo status=ok rows={}",
            courses.len()
        );
        Ok(courses)
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn create(&self, course: &mut Course) -> RepoResult<()> {
        course.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO courses (
                id,
                name,
                code,
                professor,
                location,
                semester,
                credits,
                color,
                description,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                course.id,
                course.name,
                course.code,
                course.professor,
                course.location,
                course.semester,
                course.credits,
                course.color,
                course.description,
                course.created_at,
                course.updated_at,
            ],
        )
        .map_err(|err| map_write_error(ENTITY, err))?;
        insert_schedules(&tx, course)?;
        tx.commit()?;

        adopt_schedule(course);
        Ok(())
    }

    fn update(&self, course: &mut Course) -> RepoResult<()> {
        course.validate()?;
        let updated_at = self.clock.now();

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE courses
             SET
                name = ?1,
                code = ?2,
                professor = ?3,
                location = ?4,
                semester = ?5,
                credits = ?6,
                color = ?7,
                description = ?8,
                updated_at = ?9
             WHERE id = ?10;",
            params![
                course.name,
                course.code,
                course.professor,
                course.location,
                course.semester,
                course.credits,
                course.color,
                course.description,
                updated_at,
                course.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, course.id.as_str()));
        }
        tx.execute(
            "DELETE FROM course_schedules WHERE course_id = ?1;",
            params![course.id],
        )?;
        insert_schedules(&tx, course)?;
        tx.commit()?;

        course.updated_at = updated_at;
        adopt_schedule(course);
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM courses WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Course> {
        self.query_courses(&format!("{COURSE_SELECT_SQL} WHERE id = ?1;"), params![id])?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::not_found(ENTITY, id))
    }

    fn get_all(&self) -> RepoResult<Vec<Course>> {
        self.query_courses(&format!("{COURSE_SELECT_SQL} ORDER BY name ASC;"), params![])
    }

    fn get_by_semester(&self, semester: &str) -> RepoResult<Vec<Course>> {
        self.query_courses(
            &format!("{COURSE_SELECT_SQL} WHERE semester = ?1 ORDER BY name ASC;"),
            params![semester],
        )
    }

    fn get_schedules(&self, course_id: &str) -> RepoResult<Vec<CourseSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, day_of_week, start_time, end_time, created_at
             FROM course_schedules
             WHERE course_id = ?1
             ORDER BY day_of_week ASC, start_time ASC;",
        )?;
        let schedules = stmt
            .query_map(params![course_id], |row| {
                Ok(CourseSchedule {
                    id: row.get(0)?,
                    course_id: row.get(1)?,
                    day_of_week: row.get(2)?,
                    start_time: row.get(3)?,
                    end_time: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(schedules)
    }

    fn create_note(&self, note: &CourseNote) -> RepoResult<()> {
        note.validate()?;
        let tags = serde_json::to_string(&note.tags)?;

        self.conn
            .execute(
                "INSERT INTO course_notes (
                    id,
                    course_id,
                    title,
                    content,
                    date,
                    tags,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    note.id,
                    note.course_id,
                    note.title,
                    note.content,
                    note.date,
                    tags,
                    note.created_at,
                    note.updated_at,
                ],
            )
            .map_err(|err| map_write_error("course note", err))?;
        Ok(())
    }

    fn get_notes(&self, course_id: &str) -> RepoResult<Vec<CourseNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, title, content, date, tags, created_at, updated_at
             FROM course_notes
             WHERE course_id = ?1
             ORDER BY date DESC;",
        )?;
        let mut rows = stmt.query(params![course_id])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn create_attendance(&self, attendance: &CourseAttendance) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO course_attendance (id, course_id, date, status, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    attendance.id,
                    attendance.course_id,
                    attendance.date,
                    attendance.status.as_str(),
                    attendance.notes,
                    attendance.created_at,
                ],
            )
            .map_err(|err| map_write_error("attendance", err))?;
        Ok(())
    }

    fn get_attendance(&self, course_id: &str) -> RepoResult<Vec<CourseAttendance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, date, status, notes, created_at
             FROM course_attendance
             WHERE course_id = ?1
             ORDER BY date DESC;",
        )?;
        let mut rows = stmt.query(params![course_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let status: String = row.get(3)?;
            records.push(CourseAttendance {
                id: row.get(0)?,
                course_id: row.get(1)?,
                date: row.get(2)?,
                status: parse_column("status", &status)?,
                notes: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                created_at: row.get(5)?,
            });
        }
        Ok(records)
    }

    fn create_grade(&self, grade: &Grade) -> RepoResult<()> {
        grade.validate()?;

        self.conn
            .execute(
                "INSERT INTO grades (
                    id,
                    course_id,
                    name,
                    score,
                    max_score,
                    weight,
                    date,
                    type,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    grade.id,
                    grade.course_id,
                    grade.name,
                    grade.score,
                    grade.max_score,
                    grade.weight,
                    grade.date,
                    grade.kind,
                    grade.created_at,
                ],
            )
            .map_err(|err| map_write_error("grade", err))?;
        Ok(())
    }

    fn get_grades(&self, course_id: &str) -> RepoResult<Vec<Grade>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, name, score, max_score, weight, date, type, created_at
             FROM grades
             WHERE course_id = ?1
             ORDER BY date IS NULL ASC, date DESC, created_at ASC;",
        )?;
        let grades = stmt
            .query_map(params![course_id], |row| {
                Ok(Grade {
                    id: row.get(0)?,
                    course_id: row.get(1)?,
                    name: row.get(2)?,
                    score: row.get(3)?,
                    max_score: row.get(4)?,
                    weight: row.get::<_, Option<f64>>(5)?.unwrap_or(1.0),
                    date: row.get(6)?,
                    kind: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(grades)
    }
}

/// Inserts every slot of `course` under the course's id.
fn insert_schedules(conn: &Connection, course: &Course) -> RepoResult<()> {
    for slot in &course.schedule {
        conn.execute(
            "INSERT INTO course_schedules (id, course_id, day_of_week, start_time, end_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                slot.id,
                course.id,
                slot.day_of_week,
                slot.start_time,
                slot.end_time,
                slot.created_at,
            ],
        )
        .map_err(|err| map_write_error("course schedule", err))?;
    }
    Ok(())
}

/// Matches the in-memory slots to the `course_id` that was written.
fn adopt_schedule(course: &mut Course) {
    for slot in &mut course.schedule {
        slot.course_id.clone_from(&course.id);
    }
}

fn parse_course_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        professor: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        location: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        semester: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        credits: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
        color: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        schedule: Vec::new(),
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<CourseNote> {
    let raw_tags: Option<String> = row.get(5)?;
    let tags = match raw_tags.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str(json)?,
    };

    Ok(CourseNote {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        date: row.get(4)?,
        tags,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
