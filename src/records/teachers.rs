use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::fields;
use super::{Caller, LoggedIn, Registered, INVALID_CREDENTIALS};
use crate::config::DefaultAdmin;
use crate::db::{self, teachers::DUPLICATE_EMAIL, ListQuery, Page};
use crate::error::ApiError;
use crate::fees::{aggregate_subjects, SubjectTotals};
use crate::models::{Role, Subjects, Teacher, TeacherType};
use crate::state::AppState;

const PATCHABLE: &[&str] = &[
    "name",
    "email",
    "contactNo",
    "address",
    "teacherType",
    "subjects",
    "password",
    "role",
];

const REQUIRED: &[&str] = &["name", "email", "password", "contactNo", "address", "teacherType"];

pub fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Teacher not found with id of {id}"))
}

fn empty_subjects() -> Result<SubjectTotals, ApiError> {
    Ok(aggregate_subjects(&Value::Object(Default::default()))?)
}

pub async fn register(
    state: &Arc<AppState>,
    payload: Value,
) -> Result<Registered<Teacher>, ApiError> {
    let obj = fields::as_object(&payload, "request body")?;
    let missing = REQUIRED.iter().any(|k| match obj.get(*k) {
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => true,
    });
    if missing {
        return Err(ApiError::validation("Please provide all required fields"));
    }

    let name = fields::required_str(obj, "name", "Please add a name")?;
    let email = fields::email(fields::required_str(obj, "email", "Please add an email")?)?;
    let contact_no = fields::required_str(obj, "contactNo", "Please add a contact number")?;
    let address = fields::required_str(obj, "address", "Please add an address")?;
    let teacher_type = fields::enum_value(
        &fields::required_str(obj, "teacherType", "Please select teacher type")?,
        TeacherType::parse,
        "teacherType",
    )?;
    let password = fields::password(obj.get("password").unwrap_or(&Value::Null))?;
    let totals = match obj.get("subjects") {
        None | Some(Value::Null) => empty_subjects()?,
        Some(raw) => aggregate_subjects(raw)?,
    };

    // Early exit only; the unique index is what actually guarantees it.
    let probe = email.clone();
    let exists = state
        .with_db(move |conn| Ok(db::teachers::find_by_email(conn, &probe)?.is_some()))
        .await?;
    if exists {
        return Err(ApiError::Duplicate(DUPLICATE_EMAIL.to_string()));
    }

    let password_hash = state.hash_password(password).await?;
    let teacher = Teacher {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        contact_no,
        address,
        teacher_type,
        subjects: totals.subjects,
        role: Role::Teacher,
        password_hash,
        created_at: Utc::now(),
    };

    let teacher = state
        .with_db(move |conn| {
            db::teachers::insert(conn, &teacher)
                .map_err(|e| ApiError::from_store(e, DUPLICATE_EMAIL))?;
            Ok(teacher)
        })
        .await?;

    let token = state.credentials.issue_token(&teacher.id, teacher.role)?;
    info!(id = %teacher.id, subject_fees = totals.total_fee, "teacher registered");
    Ok(Registered {
        record: teacher,
        token,
    })
}

pub async fn login(state: &Arc<AppState>, payload: Value) -> Result<LoggedIn, ApiError> {
    let obj = fields::as_object(&payload, "request body")?;
    let (Some(email), Some(password)) = (
        fields::opt_str(obj, "email"),
        obj.get("password").and_then(|v| v.as_str()).filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::validation("Please provide an email and password"));
    };

    let found = state
        .with_db(move |conn| Ok(db::teachers::find_by_email(conn, &email)?))
        .await?;
    let Some(teacher) = found else {
        return Err(ApiError::Authentication(INVALID_CREDENTIALS.to_string()));
    };
    if !state
        .verify_password(password.to_string(), teacher.password_hash.clone())
        .await?
    {
        return Err(ApiError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.credentials.issue_token(&teacher.id, teacher.role)?;
    info!(id = %teacher.id, "teacher logged in");
    Ok(LoggedIn {
        id: teacher.id,
        role: teacher.role,
        token,
    })
}

pub async fn me(state: &Arc<AppState>, caller: &Caller) -> Result<Teacher, ApiError> {
    let id = caller.id.clone();
    state
        .with_db(move |conn| db::teachers::get(conn, &id)?.ok_or_else(|| not_found(&id)))
        .await
}

pub async fn list(
    state: &Arc<AppState>,
    caller: &Caller,
    query: ListQuery,
) -> Result<Page<Teacher>, ApiError> {
    caller.require_admin()?;
    state
        .with_db(move |conn| Ok(db::teachers::list(conn, &query)?))
        .await
}

pub async fn get(state: &Arc<AppState>, caller: &Caller, id: String) -> Result<Teacher, ApiError> {
    caller.require_admin()?;
    state
        .with_db(move |conn| db::teachers::get(conn, &id)?.ok_or_else(|| not_found(&id)))
        .await
}

#[derive(Debug, Default)]
struct Patch {
    name: Option<String>,
    email: Option<String>,
    contact_no: Option<String>,
    address: Option<String>,
    teacher_type: Option<TeacherType>,
    subjects: Option<Subjects>,
    password: Option<String>,
    role: Option<Role>,
}

impl Patch {
    fn parse(payload: &Value, caller: &Caller) -> Result<Self, ApiError> {
        let obj = fields::as_object(payload, "update")?;
        fields::reject_unknown(obj, PATCHABLE)?;
        if obj.is_empty() {
            return Err(ApiError::validation("update must include at least one field"));
        }

        let mut p = Patch {
            name: fields::patch_str(obj, "name", "Please add a name")?,
            email: fields::patch_str(obj, "email", "Please add an email")?
                .map(fields::email)
                .transpose()?,
            contact_no: fields::patch_str(obj, "contactNo", "Please add a contact number")?,
            address: fields::patch_str(obj, "address", "Please add an address")?,
            ..Default::default()
        };

        if let Some(s) = fields::patch_str(obj, "teacherType", "Please select teacher type")? {
            p.teacher_type = Some(fields::enum_value(&s, TeacherType::parse, "teacherType")?);
        }
        if let Some(raw) = obj.get("subjects") {
            p.subjects = Some(aggregate_subjects(raw)?.subjects);
        }
        if let Some(raw) = obj.get("password") {
            p.password = Some(fields::password(raw)?);
        }
        if let Some(s) = fields::patch_str(obj, "role", "role must not be empty")? {
            if !caller.is_admin() {
                return Err(ApiError::Authorization(
                    "Only an admin may change a role".to_string(),
                ));
            }
            let role = fields::enum_value(&s, Role::parse, "role")?;
            if role == Role::Student {
                return Err(ApiError::validation("`student` is not a valid value for role"));
            }
            p.role = Some(role);
        }

        Ok(p)
    }

    fn apply(self, mut t: Teacher, password_hash: Option<String>) -> Teacher {
        if let Some(v) = self.name {
            t.name = v;
        }
        if let Some(v) = self.email {
            t.email = v;
        }
        if let Some(v) = self.contact_no {
            t.contact_no = v;
        }
        if let Some(v) = self.address {
            t.address = v;
        }
        if let Some(v) = self.teacher_type {
            t.teacher_type = v;
        }
        if let Some(v) = self.subjects {
            t.subjects = v;
        }
        if let Some(v) = self.role {
            t.role = v;
        }
        if let Some(h) = password_hash {
            t.password_hash = h;
        }
        t
    }
}

/// The owner or an admin may update a teacher record.
pub async fn update(
    state: &Arc<AppState>,
    caller: &Caller,
    id: String,
    payload: Value,
) -> Result<Teacher, ApiError> {
    let lookup_id = id.clone();
    let current = state
        .with_db(move |conn| {
            db::teachers::get(conn, &lookup_id)?.ok_or_else(|| not_found(&lookup_id))
        })
        .await?;
    caller.require_self_or_admin(&current.id, "teacher")?;
    let patch = Patch::parse(&payload, caller)?;

    let password_hash = match patch.password.clone() {
        Some(pw) => Some(state.hash_password(pw).await?),
        None => None,
    };

    let updated = state
        .with_db(move |conn| {
            let tx = conn.transaction()?;
            let current = db::teachers::get(&tx, &id)?.ok_or_else(|| not_found(&id))?;
            let merged = patch.apply(current, password_hash);
            db::teachers::update(&tx, &merged)
                .map_err(|e| ApiError::from_store(e, DUPLICATE_EMAIL))?;
            tx.commit()?;
            Ok(merged)
        })
        .await?;

    info!(id = %updated.id, "teacher updated");
    Ok(updated)
}

pub async fn delete(state: &Arc<AppState>, caller: &Caller, id: String) -> Result<(), ApiError> {
    caller.require_admin()?;
    let removed = state
        .with_db(move |conn| {
            match db::teachers::delete(conn, &id)? {
                0 => Err(not_found(&id)),
                _ => Ok(id),
            }
        })
        .await?;
    info!(id = %removed, "teacher deleted");
    Ok(())
}

fn required(raw: &str, missing: &str) -> Result<String, ApiError> {
    Some(raw.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation(missing))
}

/// Makes sure the configured admin account exists. An existing record with
/// that email is left alone, whatever its role.
pub async fn ensure_default_admin(
    state: &Arc<AppState>,
    admin: &DefaultAdmin,
) -> Result<(), ApiError> {
    let email = fields::email(admin.email.trim().to_string())?;
    let name = required(&admin.name, "Please add a name")?;
    let contact_no = required(&admin.contact_no, "Please add a contact number")?;
    let address = required(&admin.address, "Please add an address")?;
    let probe = email.clone();
    let existing = state
        .with_db(move |conn| Ok(db::teachers::find_by_email(conn, &probe)?))
        .await?;
    if let Some(t) = existing {
        if t.role != Role::Admin {
            warn!(id = %t.id, "default admin email belongs to a non-admin teacher");
        }
        return Ok(());
    }

    let password = fields::password(&Value::String(admin.password.clone()))?;
    let password_hash = state.hash_password(password).await?;
    let teacher = Teacher {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        contact_no,
        address,
        teacher_type: TeacherType::FullTime,
        subjects: empty_subjects()?.subjects,
        role: Role::Admin,
        password_hash,
        created_at: Utc::now(),
    };
    let id = teacher.id.clone();
    state
        .with_db(move |conn| {
            db::teachers::insert(conn, &teacher)
                .map_err(|e| ApiError::from_store(e, DUPLICATE_EMAIL))
        })
        .await?;
    info!(%id, "default admin created");
    Ok(())
}
