use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::auth::{token_cookie, Auth, JsonBody};
use crate::api::envelope;
use crate::db::ListQuery;
use crate::error::ApiError;
use crate::records::students;
use crate::state::AppState;

async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let reg = students::register(&state, body).await?;
    let cookie = token_cookie(&state.config, &reg.token)?;
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "token": reg.token,
            "data": reg.record,
        })),
    )
        .into_response())
}

async fn list(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = ListQuery::from_params(&params)?;
    let page = students::list(&state, &caller, query).await?;
    Ok(envelope::page(page))
}

async fn list_by_course(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(course): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = ListQuery::from_params(&params)?;
    let page = students::list_by_course(&state, &caller, &course, query).await?;
    Ok(envelope::page(page))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let student = students::get(&state, &caller, id).await?;
    Ok(envelope::data(student))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let student = students::update(&state, &caller, id, body).await?;
    Ok(envelope::data(student))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    students::delete(&state, &caller, id).await?;
    Ok(envelope::data(json!({})))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/students", post(register).get(list))
        .route("/students/course/:course", get(list_by_course))
        .route("/students/:id", get(get_one).put(update).delete(remove))
}
