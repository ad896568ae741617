use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response, routing::post, Router};

use crate::api::auth::JsonBody;
use crate::api::envelope;
use crate::error::ApiError;
use crate::records::{students, teachers, LoggedIn};
use crate::state::AppState;

async fn register_teacher(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let reg = teachers::register(&state, body).await?;
    let login = LoggedIn {
        id: reg.record.id,
        role: reg.record.role,
        token: reg.token,
    };
    envelope::token(&state.config, StatusCode::CREATED, login)
}

async fn login_teacher(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let login = teachers::login(&state, body).await?;
    envelope::token(&state.config, StatusCode::OK, login)
}

async fn login_student(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let login = students::login(&state, body).await?;
    envelope::token(&state.config, StatusCode::OK, login)
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/teachers/register", post(register_teacher))
        .route("/auth/teachers/login", post(login_teacher))
        .route("/auth/students/login", post(login_student))
}
