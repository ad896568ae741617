use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ApiError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn as_object<'a>(payload: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ApiError> {
    payload
        .as_object()
        .ok_or_else(|| ApiError::validation(format!("{what} must be a JSON object")))
}

/// Rejects keys outside `allowed`, naming the first offender.
pub fn reject_unknown(obj: &Map<String, Value>, allowed: &[&str]) -> Result<(), ApiError> {
    match obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(k) => Err(ApiError::validation(format!("Field {k} cannot be updated"))),
        None => Ok(()),
    }
}

/// Trimmed, non-empty string or `None`.
pub fn opt_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_str(obj: &Map<String, Value>, key: &str, missing: &str) -> Result<String, ApiError> {
    opt_str(obj, key).ok_or_else(|| ApiError::validation(missing))
}

/// Field present in a patch. A patch value that is present but null, empty
/// or not a string is a validation failure rather than a no-op.
pub fn patch_str(
    obj: &Map<String, Value>,
    key: &str,
    missing: &str,
) -> Result<Option<String>, ApiError> {
    if !obj.contains_key(key) {
        return Ok(None);
    }
    required_str(obj, key, missing).map(Some)
}

pub fn email(raw: String) -> Result<String, ApiError> {
    if EMAIL_RE.is_match(&raw) {
        Ok(raw)
    } else {
        Err(ApiError::validation("Please add a valid email"))
    }
}

pub fn password(raw: &Value) -> Result<String, ApiError> {
    let Some(s) = raw.as_str().filter(|s| !s.is_empty()) else {
        return Err(ApiError::validation("Please add a password"));
    };
    if s.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(s.to_string())
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn date(raw: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::validation(format!("{field} must be a valid date")))
}

pub fn date_order(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ApiError> {
    if end > start {
        Ok(())
    } else {
        Err(ApiError::validation("End date must be after start date"))
    }
}

pub fn enum_value<T>(
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
    field: &str,
) -> Result<T, ApiError> {
    parse(raw).ok_or_else(|| {
        ApiError::validation(format!("`{raw}` is not a valid value for {field}"))
    })
}
