use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{CourseEntry, Courses, Subject, SubjectFee, Subjects};

#[derive(Debug, Error, PartialEq)]
pub enum FeeError {
    #[error("courses must be an object keyed by subject")]
    NotAnObject,
    #[error("Unknown course subject: {0}")]
    UnknownSubject(String),
    #[error("course entry for {0} must be an object")]
    BadEntry(&'static str),
    #[error("fee total for {0} is out of range")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseTotals {
    pub courses: Courses,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTotals {
    pub subjects: Subjects,
    pub total_fee: i64,
}

// 2^63; `i64::MAX as f64` rounds up to this.
const I64_RANGE_END: f64 = 9_223_372_036_854_775_808.0;

/// Integer coercion with `parseInt` semantics: numbers truncate toward zero,
/// strings yield their leading (optionally signed) run of digits. Values
/// outside `i64` yield `None`.
pub fn coerce_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .map(f64::trunc)
                .filter(|f| (-I64_RANGE_END..I64_RANGE_END).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim_start();
            let (neg, digits) = match s.as_bytes().first() {
                Some(b'-') => (true, &s[1..]),
                Some(b'+') => (false, &s[1..]),
                _ => (false, s),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            let n: i64 = digits[..end].parse().ok()?;
            Some(if neg { -n } else { n })
        }
        _ => None,
    }
}

fn fee_present(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Splits a raw course map into per-subject entries. Missing subjects come
/// back as `None`; unknown keys are rejected.
fn entries(raw: &Value) -> Result<Vec<(Subject, Option<&Map<String, Value>>)>, FeeError> {
    let map = raw.as_object().ok_or(FeeError::NotAnObject)?;
    if let Some(unknown) = map.keys().find(|k| Subject::from_key(k).is_none()) {
        return Err(FeeError::UnknownSubject(unknown.clone()));
    }

    Subject::ALL
        .into_iter()
        .map(|s| match map.get(s.key()) {
            None | Some(Value::Null) => Ok((s, None)),
            Some(Value::Object(o)) => Ok((s, Some(o))),
            Some(_) => Err(FeeError::BadEntry(s.key())),
        })
        .collect()
}

/// Returns the coerced fee for entries that are selected and carry a fee.
fn selected_fee(entry: Option<&Map<String, Value>>) -> Option<i64> {
    let entry = entry?;
    let selected = entry
        .get("selected")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !selected || !fee_present(entry.get("fee")) {
        return None;
    }
    Some(entry.get("fee").and_then(coerce_int).unwrap_or(0))
}

/// Normalizes a student course map and computes per-course totals and the
/// overall amount due. A selected entry keeps `selected: true` even with a
/// zero fee; anything else is zeroed.
pub fn aggregate_courses(raw: &Value) -> Result<CourseTotals, FeeError> {
    let mut courses = Courses::default();
    let mut total_amount: i64 = 0;

    for (subject, entry) in entries(raw)? {
        let Some(fee) = selected_fee(entry) else {
            continue;
        };
        let classes = entry
            .and_then(|e| e.get("classes"))
            .and_then(coerce_int)
            .filter(|c| *c >= 1)
            .unwrap_or(1);
        let total = fee
            .checked_mul(classes)
            .ok_or(FeeError::Overflow(subject.key()))?;
        total_amount = total_amount
            .checked_add(total)
            .ok_or(FeeError::Overflow(subject.key()))?;

        *courses.get_mut(subject) = CourseEntry {
            selected: true,
            fee,
            classes,
            total,
        };
    }

    Ok(CourseTotals {
        courses,
        total_amount,
    })
}

/// Teacher variant: no class dimension, each selected subject contributes
/// its fee as-is.
pub fn aggregate_subjects(raw: &Value) -> Result<SubjectTotals, FeeError> {
    let mut subjects = Subjects::default();
    let mut total_fee: i64 = 0;

    for (subject, entry) in entries(raw)? {
        let Some(fee) = selected_fee(entry) else {
            continue;
        };
        total_fee = total_fee
            .checked_add(fee)
            .ok_or(FeeError::Overflow(subject.key()))?;
        *subjects.get_mut(subject) = SubjectFee {
            selected: true,
            fee,
        };
    }

    Ok(SubjectTotals {
        subjects,
        total_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_int_takes_leading_digits_of_strings() {
        assert_eq!(coerce_int(&json!("  42px")), Some(42));
        assert_eq!(coerce_int(&json!("-7")), Some(-7));
        assert_eq!(coerce_int(&json!("+8")), Some(8));
        assert_eq!(coerce_int(&json!("abc")), None);
        assert_eq!(coerce_int(&json!("")), None);
        assert_eq!(coerce_int(&json!("-")), None);
        assert_eq!(coerce_int(&json!("99999999999999999999")), None);
    }

    #[test]
    fn coerce_int_truncates_numbers() {
        assert_eq!(coerce_int(&json!(3.99)), Some(3));
        assert_eq!(coerce_int(&json!(-3.99)), Some(-3));
        assert_eq!(coerce_int(&json!(i64::MAX)), Some(i64::MAX));
        assert_eq!(coerce_int(&json!(u64::MAX)), None);
        assert_eq!(coerce_int(&json!(1e20)), None);
        assert_eq!(coerce_int(&json!(-1e20)), None);
        assert_eq!(coerce_int(&json!(true)), None);
        assert_eq!(coerce_int(&json!(null)), None);
    }

    #[test]
    fn out_of_range_fee_counts_as_zero_not_overflow() {
        let out = aggregate_courses(&json!({
            "physics": { "selected": true, "fee": 1e20, "classes": 2 }
        }))
        .expect("aggregate");
        assert_eq!(out.courses.physics.fee, 0);
        assert_eq!(out.total_amount, 0);
    }
}
