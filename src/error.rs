use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rusqlite::ErrorCode;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        ApiError::Internal(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to a client. Internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Server Error".to_string(),
            other => other.to_string(),
        }
    }

    /// Maps a store failure, turning constraint violations into the
    /// client-facing kinds. `duplicate` is the message used for a UNIQUE hit.
    pub fn from_store(e: rusqlite::Error, duplicate: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(ref f, ref msg) = e {
            if f.code == ErrorCode::ConstraintViolation {
                let detail = msg.as_deref().unwrap_or_default();
                if detail.starts_with("UNIQUE") {
                    return ApiError::Duplicate(duplicate.to_string());
                }
                if detail.starts_with("CHECK") {
                    return ApiError::Validation(format!("Constraint violated: {detail}"));
                }
            }
        }
        ApiError::Internal(e.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::from_store(e, "Duplicate field value entered")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(detail) => tracing::error!(%detail, "request failed"),
            other => tracing::debug!(%status, error = %other, "request rejected"),
        }

        (
            status,
            Json(json!({
                "success": false,
                "error": self.public_message(),
            })),
        )
            .into_response()
    }
}
