pub mod students;
pub mod teachers;

use std::collections::HashMap;
use std::path::Path;

use rusqlite::Connection;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::models::Role;

pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Dates are written by rusqlite's chrono adapter in one fixed UTC format,
    // so the text comparison in the CHECK orders them correctly.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0),
            email TEXT NOT NULL UNIQUE,
            contact_no TEXT NOT NULL CHECK(length(contact_no) > 0),
            address TEXT NOT NULL CHECK(length(address) > 0),
            class_name TEXT NOT NULL,
            courses TEXT NOT NULL,
            course_mode TEXT NOT NULL DEFAULT 'online'
                CHECK(course_mode IN ('online', 'offline')),
            role TEXT NOT NULL DEFAULT 'student'
                CHECK(role IN ('student', 'admin')),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            total_amount INTEGER NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            CHECK(end_date > start_date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_created ON students(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0),
            email TEXT NOT NULL UNIQUE,
            contact_no TEXT NOT NULL CHECK(length(contact_no) > 0),
            address TEXT NOT NULL CHECK(length(address) > 0),
            teacher_type TEXT NOT NULL
                CHECK(teacher_type IN ('full-time', 'part-time')),
            subjects TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'teacher'
                CHECK(role IN ('teacher', 'admin')),
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_created ON teachers(created_at)",
        [],
    )?;

    Ok(())
}

pub const DEFAULT_LIMIT: i64 = 25;
pub const MAX_LIMIT: i64 = 100;

/// Paging and ordering for list queries, resolved from request parameters
/// and handed to SQLite as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub sort_column: &'static str,
    pub descending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort_column: "created_at",
            descending: true,
        }
    }
}

impl ListQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ApiError> {
        let mut q = ListQuery::default();

        if let Some(v) = params.get("page") {
            q.page = v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| ApiError::validation("page must be a positive integer"))?;
        }
        if let Some(v) = params.get("limit") {
            q.limit = v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|l| (1..=MAX_LIMIT).contains(l))
                .ok_or_else(|| {
                    ApiError::validation(format!("limit must be between 1 and {MAX_LIMIT}"))
                })?;
        }
        if let Some(v) = params.get("sort") {
            let v = v.trim();
            let (descending, key) = match v.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, v),
            };
            q.sort_column = match key {
                "name" => "name",
                "email" => "email",
                "createdAt" => "created_at",
                other => {
                    return Err(ApiError::validation(format!(
                        "cannot sort by {other:?}"
                    )))
                }
            };
            q.descending = descending;
        }

        Ok(q)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// ORDER BY / LIMIT / OFFSET tail. The column comes from a fixed list,
    /// never from raw input.
    fn sql_tail(&self) -> String {
        format!(
            "ORDER BY {} {}, id LIMIT {} OFFSET {}",
            self.sort_column,
            if self.descending { "DESC" } else { "ASC" },
            self.limit,
            self.offset()
        )
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub query: ListQuery,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.query.offset() + (self.items.len() as i64) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.query.page > 1
    }
}

fn json_column<T: DeserializeOwned>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn enum_column<T>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unexpected value {raw:?}").into(),
        )
    })
}

/// Current role of the account behind `id`, looked up across both record
/// kinds. `None` once the record is gone.
pub fn account_role(conn: &Connection, id: &str) -> rusqlite::Result<Option<Role>> {
    use rusqlite::OptionalExtension;

    let raw: Option<String> = conn
        .query_row(
            "SELECT role FROM students WHERE id = ?1
             UNION ALL
             SELECT role FROM teachers WHERE id = ?1
             LIMIT 1",
            [id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(raw.as_deref().and_then(Role::parse))
}
