use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::auth::token_cookie;
use crate::config::Config;
use crate::db::Page;
use crate::error::ApiError;
use crate::records::LoggedIn;

pub fn data<T: Serialize>(value: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": value,
    }))
}

/// List envelope with the paging cursor shape clients already rely on:
/// `next`/`prev` appear only when such a page exists.
pub fn page<T: Serialize>(page: Page<T>) -> Json<Value> {
    let mut pagination = json!({});
    if page.has_next() {
        pagination["next"] = json!({ "page": page.query.page + 1, "limit": page.query.limit });
    }
    if page.has_prev() {
        pagination["prev"] = json!({ "page": page.query.page - 1, "limit": page.query.limit });
    }

    Json(json!({
        "success": true,
        "count": page.items.len(),
        "total": page.total,
        "pagination": pagination,
        "data": page.items,
    }))
}

/// `{success, token, role, id}` plus the auth cookie.
pub fn token(config: &Config, status: StatusCode, login: LoggedIn) -> Result<Response, ApiError> {
    let cookie = token_cookie(config, &login.token)?;
    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "token": login.token,
            "role": login.role,
            "id": login.id,
        })),
    )
        .into_response())
}
