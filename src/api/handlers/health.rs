use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": { "version": env!("CARGO_PKG_VERSION") }
    }))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
