//! Registration, retrieval, update and deletion of student and teacher
//! records. Every operation is one request's worth of work: validate, touch
//! the store, answer.

pub mod fields;
pub mod students;
pub mod teachers;

use crate::credentials::Claims;
use crate::error::ApiError;
use crate::fees::FeeError;
use crate::models::Role;

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl From<Claims> for Caller {
    fn from(c: Claims) -> Self {
        Self {
            id: c.sub,
            role: c.role,
        }
    }
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Authorization(format!(
                "User role {} is not authorized to access this route",
                self.role.as_str()
            )))
        }
    }

    pub fn require_self_or_admin(&self, owner_id: &str, what: &str) -> Result<(), ApiError> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(ApiError::Authorization(format!(
                "User {} is not authorized to update this {what}",
                self.id
            )))
        }
    }
}

/// A freshly created record and the token bound to it.
#[derive(Debug, Clone)]
pub struct Registered<T> {
    pub record: T,
    pub token: String,
}

/// Outcome of a successful password login.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    pub id: String,
    pub role: Role,
    pub token: String,
}

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

impl From<FeeError> for ApiError {
    fn from(e: FeeError) -> Self {
        ApiError::Validation(e.to_string())
    }
}
