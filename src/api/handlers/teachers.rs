use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::auth::{Auth, JsonBody};
use crate::api::envelope;
use crate::db::ListQuery;
use crate::error::ApiError;
use crate::records::teachers;
use crate::state::AppState;

async fn me(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
) -> Result<Json<Value>, ApiError> {
    let teacher = teachers::me(&state, &caller).await?;
    Ok(envelope::data(teacher))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = ListQuery::from_params(&params)?;
    let page = teachers::list(&state, &caller, query).await?;
    Ok(envelope::page(page))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let teacher = teachers::get(&state, &caller, id).await?;
    Ok(envelope::data(teacher))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let teacher = teachers::update(&state, &caller, id, body).await?;
    Ok(envelope::data(teacher))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    teachers::delete(&state, &caller, id).await?;
    Ok(envelope::data(json!({})))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/teachers", get(list))
        .route("/teachers/me", get(me))
        .route("/teachers/:id", get(get_one).put(update).delete(remove))
}
