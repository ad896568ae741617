use rusqlite::{Connection, OptionalExtension, Row};

use super::{enum_column, json_column, ListQuery, Page};
use crate::models::{CourseMode, Role, Student, Subject};

pub const DUPLICATE_EMAIL: &str = "Student already exists with this email";

const COLUMNS: &str = "id, name, email, contact_no, address, class_name, courses, course_mode,
     role, start_date, end_date, total_amount, password_hash, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        contact_no: row.get(3)?,
        address: row.get(4)?,
        class_name: row.get(5)?,
        courses: json_column(row, 6)?,
        course_mode: enum_column(row, 7, CourseMode::parse)?,
        role: enum_column(row, 8, Role::parse)?,
        start_date: row.get(9)?,
        end_date: row.get(10)?,
        total_amount: row.get(11)?,
        password_hash: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn courses_json(s: &Student) -> rusqlite::Result<String> {
    serde_json::to_string(&s.courses).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn insert(conn: &Connection, s: &Student) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO students(
           id, name, email, contact_no, address, class_name, courses, course_mode,
           role, start_date, end_date, total_amount, password_hash, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            s.id,
            s.name,
            s.email,
            s.contact_no,
            s.address,
            s.class_name,
            courses_json(s)?,
            s.course_mode.as_str(),
            s.role.as_str(),
            s.start_date,
            s.end_date,
            s.total_amount,
            s.password_hash,
            s.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM students WHERE id = ?"),
        [id],
        from_row,
    )
    .optional()
}

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM students WHERE email = ?"),
        [email],
        from_row,
    )
    .optional()
}

/// Writes every mutable column of an existing record. Returns the number of
/// rows touched (0 when the id is gone).
pub fn update(conn: &Connection, s: &Student) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE students SET
           name = ?, email = ?, contact_no = ?, address = ?, class_name = ?,
           courses = ?, course_mode = ?, role = ?, start_date = ?, end_date = ?,
           total_amount = ?, password_hash = ?
         WHERE id = ?",
        rusqlite::params![
            s.name,
            s.email,
            s.contact_no,
            s.address,
            s.class_name,
            courses_json(s)?,
            s.course_mode.as_str(),
            s.role.as_str(),
            s.start_date,
            s.end_date,
            s.total_amount,
            s.password_hash,
            s.id,
        ],
    )
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM students WHERE id = ?", [id])
}

pub fn list(conn: &Connection, query: &ListQuery) -> rusqlite::Result<Page<Student>> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM students {}",
        query.sql_tail()
    ))?;
    let items = stmt
        .query_map([], from_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(Page {
        items,
        total,
        query: query.clone(),
    })
}

/// Students whose course entry for `subject` is selected.
pub fn list_by_course(
    conn: &Connection,
    subject: Subject,
    query: &ListQuery,
) -> rusqlite::Result<Page<Student>> {
    let path = format!("$.{}.selected", subject.key());
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE json_extract(courses, ?) = 1",
        [&path],
        |r| r.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM students WHERE json_extract(courses, ?) = 1 {}",
        query.sql_tail()
    ))?;
    let items = stmt
        .query_map([&path], from_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(Page {
        items,
        total,
        query: query.clone(),
    })
}
