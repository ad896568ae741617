use rusqlite::{Connection, OptionalExtension, Row};

use super::{enum_column, json_column, ListQuery, Page};
use crate::models::{Role, Teacher, TeacherType};

pub const DUPLICATE_EMAIL: &str = "Teacher already exists with this email";

const COLUMNS: &str =
    "id, name, email, contact_no, address, teacher_type, subjects, role, password_hash, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        contact_no: row.get(3)?,
        address: row.get(4)?,
        teacher_type: enum_column(row, 5, TeacherType::parse)?,
        subjects: json_column(row, 6)?,
        role: enum_column(row, 7, Role::parse)?,
        password_hash: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn subjects_json(t: &Teacher) -> rusqlite::Result<String> {
    serde_json::to_string(&t.subjects).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn insert(conn: &Connection, t: &Teacher) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO teachers(
           id, name, email, contact_no, address, teacher_type, subjects, role,
           password_hash, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            t.id,
            t.name,
            t.email,
            t.contact_no,
            t.address,
            t.teacher_type.as_str(),
            subjects_json(t)?,
            t.role.as_str(),
            t.password_hash,
            t.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> rusqlite::Result<Option<Teacher>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM teachers WHERE id = ?"),
        [id],
        from_row,
    )
    .optional()
}

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<Teacher>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM teachers WHERE email = ?"),
        [email],
        from_row,
    )
    .optional()
}

pub fn update(conn: &Connection, t: &Teacher) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE teachers SET
           name = ?, email = ?, contact_no = ?, address = ?, teacher_type = ?,
           subjects = ?, role = ?, password_hash = ?
         WHERE id = ?",
        rusqlite::params![
            t.name,
            t.email,
            t.contact_no,
            t.address,
            t.teacher_type.as_str(),
            subjects_json(t)?,
            t.role.as_str(),
            t.password_hash,
            t.id,
        ],
    )
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM teachers WHERE id = ?", [id])
}

pub fn list(conn: &Connection, query: &ListQuery) -> rusqlite::Result<Page<Teacher>> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM teachers", [], |r| r.get(0))?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM teachers {}",
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
