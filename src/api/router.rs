use std::any::Any;
use std::sync::Arc;

use axum::{
    error_handling::HandleErrorLayer,
    response::{IntoResponse, Response},
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use crate::error::ApiError;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

async fn timeout_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout("Request timed out".to_string())
    } else {
        ApiError::internal(format!("unhandled middleware error: {err}"))
    }
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(handlers::health::routes())
        .merge(handlers::students::routes())
        .merge(handlers::teachers::routes())
        .merge(handlers::auth::routes());

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(timeout_error))
                .timeout(state.config.request_timeout),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
