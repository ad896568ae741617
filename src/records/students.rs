use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::fields;
use super::{Caller, LoggedIn, Registered, INVALID_CREDENTIALS};
use crate::db::{self, students::DUPLICATE_EMAIL, ListQuery, Page};
use crate::error::ApiError;
use crate::fees::{aggregate_courses, CourseTotals};
use crate::models::{CourseMode, Role, Student, Subject};
use crate::state::AppState;

const PATCHABLE: &[&str] = &[
    "name",
    "email",
    "contactNo",
    "address",
    "className",
    "courses",
    "courseMode",
    "startDate",
    "endDate",
    "password",
    "role",
];

pub fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Student not found with id of {id}"))
}

/// Validated registration input, fees already aggregated.
#[derive(Debug, Clone)]
struct Draft {
    name: String,
    email: String,
    contact_no: String,
    address: String,
    class_name: String,
    totals: CourseTotals,
    course_mode: CourseMode,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    password: String,
}

impl Draft {
    fn from_payload(payload: &Value) -> Result<Self, ApiError> {
        let obj = fields::as_object(payload, "request body")?;

        let name = fields::required_str(obj, "name", "Please add a name")?;
        let email = fields::email(fields::required_str(obj, "email", "Please add an email")?)?;
        let contact_no = fields::required_str(obj, "contactNo", "Please add a contact number")?;
        let address = fields::required_str(obj, "address", "Please add an address")?;
        let class_name = fields::required_str(obj, "className", "Please enter a class")?;
        let course_mode = match fields::opt_str(obj, "courseMode") {
            Some(s) => fields::enum_value(&s, CourseMode::parse, "courseMode")?,
            None => CourseMode::default(),
        };
        let start_date = fields::date(
            &fields::required_str(obj, "startDate", "Please add a start date")?,
            "startDate",
        )?;
        let end_date = fields::date(
            &fields::required_str(obj, "endDate", "Please add an end date")?,
            "endDate",
        )?;
        fields::date_order(start_date, end_date)?;
        let password = fields::password(obj.get("password").unwrap_or(&Value::Null))?;

        let totals = match obj.get("courses") {
            None | Some(Value::Null) => aggregate_courses(&Value::Object(Default::default()))?,
            Some(raw) => aggregate_courses(raw)?,
        };

        Ok(Self {
            name,
            email,
            contact_no,
            address,
            class_name,
            totals,
            course_mode,
            start_date,
            end_date,
            password,
        })
    }
}

/// Validated update input. Each present field has already passed its own
/// check; cross-field checks run on the merged record.
#[derive(Debug, Clone, Default)]
struct Patch {
    name: Option<String>,
    email: Option<String>,
    contact_no: Option<String>,
    address: Option<String>,
    class_name: Option<String>,
    totals: Option<CourseTotals>,
    course_mode: Option<CourseMode>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
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
            class_name: fields::patch_str(obj, "className", "Please enter a class")?,
            ..Default::default()
        };

        if let Some(s) = fields::patch_str(obj, "courseMode", "courseMode must not be empty")? {
            p.course_mode = Some(fields::enum_value(&s, CourseMode::parse, "courseMode")?);
        }
        if let Some(s) = fields::patch_str(obj, "startDate", "Please add a start date")? {
            p.start_date = Some(fields::date(&s, "startDate")?);
        }
        if let Some(s) = fields::patch_str(obj, "endDate", "Please add an end date")? {
            p.end_date = Some(fields::date(&s, "endDate")?);
        }
        // The patch map replaces the stored one wholesale.
        if let Some(raw) = obj.get("courses") {
            p.totals = Some(aggregate_courses(raw)?);
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
            if role == Role::Teacher {
                return Err(ApiError::validation("`teacher` is not a valid value for role"));
            }
            p.role = Some(role);
        }

        Ok(p)
    }

    /// Merges onto the stored record. `password_hash` replaces the stored
    /// hash only when the patch carried a password.
    fn apply(self, mut s: Student, password_hash: Option<String>) -> Result<Student, ApiError> {
        if let Some(v) = self.name {
            s.name = v;
        }
        if let Some(v) = self.email {
            s.email = v;
        }
        if let Some(v) = self.contact_no {
            s.contact_no = v;
        }
        if let Some(v) = self.address {
            s.address = v;
        }
        if let Some(v) = self.class_name {
            s.class_name = v;
        }
        if let Some(v) = self.course_mode {
            s.course_mode = v;
        }
        if let Some(v) = self.start_date {
            s.start_date = v;
        }
        if let Some(v) = self.end_date {
            s.end_date = v;
        }
        if let Some(totals) = self.totals {
            s.courses = totals.courses;
            s.total_amount = totals.total_amount;
        }
        if let Some(v) = self.role {
            s.role = v;
        }
        if let Some(h) = password_hash {
            s.password_hash = h;
        }

        fields::date_order(s.start_date, s.end_date)?;
        Ok(s)
    }
}

pub async fn register(
    state: &Arc<AppState>,
    payload: Value,
) -> Result<Registered<Student>, ApiError> {
    let draft = Draft::from_payload(&payload)?;
    let password_hash = state.hash_password(draft.password).await?;

    let student = Student {
        id: Uuid::new_v4().to_string(),
        name: draft.name,
        email: draft.email,
        contact_no: draft.contact_no,
        address: draft.address,
        class_name: draft.class_name,
        courses: draft.totals.courses,
        course_mode: draft.course_mode,
        role: Role::Student,
        start_date: draft.start_date,
        end_date: draft.end_date,
        total_amount: draft.totals.total_amount,
        password_hash,
        created_at: Utc::now(),
    };

    let student = state
        .with_db(move |conn| {
            db::students::insert(conn, &student)
                .map_err(|e| ApiError::from_store(e, DUPLICATE_EMAIL))?;
            Ok(student)
        })
        .await?;

    let token = state.credentials.issue_token(&student.id, student.role)?;
    info!(id = %student.id, total_amount = student.total_amount, "student registered");
    Ok(Registered {
        record: student,
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
        .with_db(move |conn| Ok(db::students::find_by_email(conn, &email)?))
        .await?;
    let Some(student) = found else {
        return Err(ApiError::Authentication(INVALID_CREDENTIALS.to_string()));
    };
    if !state
        .verify_password(password.to_string(), student.password_hash.clone())
        .await?
    {
        return Err(ApiError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.credentials.issue_token(&student.id, student.role)?;
    info!(id = %student.id, "student logged in");
    Ok(LoggedIn {
        id: student.id,
        role: student.role,
        token,
    })
}

pub async fn list(
    state: &Arc<AppState>,
    caller: &Caller,
    query: ListQuery,
) -> Result<Page<Student>, ApiError> {
    caller.require_admin()?;
    state
        .with_db(move |conn| Ok(db::students::list(conn, &query)?))
        .await
}

pub async fn list_by_course(
    state: &Arc<AppState>,
    caller: &Caller,
    course: &str,
    query: ListQuery,
) -> Result<Page<Student>, ApiError> {
    caller.require_admin()?;
    let subject = Subject::from_key(course)
        .ok_or_else(|| ApiError::validation(format!("Unknown course subject: {course}")))?;
    state
        .with_db(move |conn| Ok(db::students::list_by_course(conn, subject, &query)?))
        .await
}

/// Readable by the student themself, by teachers and by admins.
pub async fn get(state: &Arc<AppState>, caller: &Caller, id: String) -> Result<Student, ApiError> {
    let student = state
        .with_db(move |conn| db::students::get(conn, &id)?.ok_or_else(|| not_found(&id)))
        .await?;

    if caller.role == Role::Teacher || caller.is_admin() || caller.id == student.id {
        Ok(student)
    } else {
        Err(ApiError::Authorization(format!(
            "User {} is not authorized to view this student",
            caller.id
        )))
    }
}

pub async fn update(
    state: &Arc<AppState>,
    caller: &Caller,
    id: String,
    payload: Value,
) -> Result<Student, ApiError> {
    let lookup_id = id.clone();
    let current = state
        .with_db(move |conn| {
            db::students::get(conn, &lookup_id)?.ok_or_else(|| not_found(&lookup_id))
        })
        .await?;
    caller.require_self_or_admin(&current.id, "student")?;
    let patch = Patch::parse(&payload, caller)?;

    let password_hash = match patch.password.clone() {
        Some(pw) => Some(state.hash_password(pw).await?),
        None => None,
    };

    let updated = state
        .with_db(move |conn| {
            let tx = conn.transaction()?;
            let current = db::students::get(&tx, &id)?.ok_or_else(|| not_found(&id))?;
            let merged = patch.apply(current, password_hash)?;
            db::students::update(&tx, &merged)
                .map_err(|e| ApiError::from_store(e, DUPLICATE_EMAIL))?;
            tx.commit()?;
            Ok(merged)
        })
        .await?;

    info!(id = %updated.id, total_amount = updated.total_amount, "student updated");
    Ok(updated)
}

pub async fn delete(state: &Arc<AppState>, caller: &Caller, id: String) -> Result<(), ApiError> {
    caller.require_admin()?;
    let removed = state
        .with_db(move |conn| {
            match db::students::delete(conn, &id)? {
                0 => Err(not_found(&id)),
                _ => Ok(id),
            }
        })
        .await?;
    info!(id = %removed, "student deleted");
    Ok(())
}
