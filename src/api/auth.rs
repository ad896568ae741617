use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    Json,
};
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::config::Config;
use crate::db;
use crate::error::ApiError;
use crate::records::Caller;
use crate::state::AppState;

const TOKEN_COOKIE: &str = "token";

fn not_authorized() -> ApiError {
    ApiError::Authentication("Not authorized to access this route".to_string())
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

/// Authenticated caller. Accepts a bearer token or the `token` cookie; the
/// role is re-read from the store so deleted or demoted accounts lose access
/// straight away.
#[derive(Debug, Clone)]
pub struct Auth(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers)
            .or_else(|| cookie(&parts.headers, TOKEN_COOKIE))
            .ok_or_else(not_authorized)?;
        let claims = state.credentials.verify_token(&token)?;

        let id = claims.sub.clone();
        let role = state
            .with_db(move |conn| Ok(db::account_role(conn, &id)?))
            .await?
            .ok_or_else(|| {
                tracing::debug!(id = %claims.sub, "token for a removed account");
                not_authorized()
            })?;

        let mut caller = Caller::from(claims);
        caller.role = role;
        Ok(Auth(caller))
    }
}

/// JSON request body whose parse failures come back in the error envelope.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// `Set-Cookie` value carrying the auth token.
pub fn token_cookie(config: &Config, token: &str) -> Result<HeaderValue, ApiError> {
    let expires = Utc::now() + Duration::days(config.cookie_expire_days);
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; Path=/; HttpOnly; Expires={}",
        expires.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(ApiError::internal)
}
