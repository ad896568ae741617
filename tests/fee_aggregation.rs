use serde_json::json;
use zield::fees::{aggregate_courses, aggregate_subjects, FeeError};
use zield::models::{CourseEntry, SubjectFee};

fn zeroed() -> CourseEntry {
    CourseEntry {
        selected: false,
        fee: 0,
        classes: 0,
        total: 0,
    }
}

#[test]
fn selected_course_multiplies_fee_by_classes_and_unselected_is_zeroed() {
    let out = aggregate_courses(&json!({
        "physics": { "selected": true, "fee": 100, "classes": 3 },
        "chemistry": { "selected": false }
    }))
    .expect("aggregate");

    assert_eq!(out.total_amount, 300);
    assert_eq!(
        out.courses.physics,
        CourseEntry {
            selected: true,
            fee: 100,
            classes: 3,
            total: 300
        }
    );
    assert_eq!(out.courses.chemistry, zeroed());
    assert_eq!(out.courses.math, zeroed());
    assert_eq!(out.courses.biology, zeroed());
    assert_eq!(out.courses.computer_science, zeroed());
}

#[test]
fn total_is_sum_across_all_selected_courses() {
    let out = aggregate_courses(&json!({
        "physics": { "selected": true, "fee": 100, "classes": 2 },
        "math": { "selected": true, "fee": "50", "classes": "4" },
        "biology": { "selected": true, "fee": 30 },
        "computerScience": { "selected": false, "fee": 999, "classes": 9 }
    }))
    .expect("aggregate");

    assert_eq!(out.courses.physics.total, 200);
    assert_eq!(out.courses.math.total, 200);
    // classes default to 1 when absent
    assert_eq!(out.courses.biology.classes, 1);
    assert_eq!(out.courses.biology.total, 30);
    // stray values on an unselected entry are wiped
    assert_eq!(out.courses.computer_science, zeroed());
    assert_eq!(out.total_amount, 430);
}

#[test]
fn fee_and_classes_are_coerced_like_parse_int() {
    let out = aggregate_courses(&json!({
        "physics": { "selected": true, "fee": "120abc", "classes": "2 sessions" },
        "chemistry": { "selected": true, "fee": 99.9, "classes": 2.7 },
        "math": { "selected": true, "fee": "not a number", "classes": 5 },
        "biology": { "selected": true, "fee": 10, "classes": "many" }
    }))
    .expect("aggregate");

    assert_eq!((out.courses.physics.fee, out.courses.physics.classes), (120, 2));
    assert_eq!((out.courses.chemistry.fee, out.courses.chemistry.classes), (99, 2));
    assert_eq!(out.courses.math.fee, 0);
    assert_eq!(out.courses.math.total, 0);
    assert_eq!(out.courses.biology.classes, 1);
    assert_eq!(out.total_amount, 240 + 198 + 10);
}

#[test]
fn selected_with_zero_fee_keeps_selected_flag() {
    let out = aggregate_courses(&json!({
        "math": { "selected": true, "fee": 0, "classes": 4 }
    }))
    .expect("aggregate");

    assert!(out.courses.math.selected);
    assert_eq!(out.courses.math.fee, 0);
    assert_eq!(out.courses.math.total, 0);
    assert_eq!(out.total_amount, 0);
}

#[test]
fn missing_or_empty_fee_normalizes_entry() {
    let out = aggregate_courses(&json!({
        "physics": { "selected": true, "classes": 3 },
        "chemistry": { "selected": true, "fee": "", "classes": 3 },
        "math": { "selected": true, "fee": null },
        "biology": null
    }))
    .expect("aggregate");

    assert_eq!(out.courses.physics, zeroed());
    assert_eq!(out.courses.chemistry, zeroed());
    assert_eq!(out.courses.math, zeroed());
    assert_eq!(out.courses.biology, zeroed());
    assert_eq!(out.total_amount, 0);
}

#[test]
fn negative_fee_is_not_rejected_and_non_positive_classes_fall_back_to_one() {
    let out = aggregate_courses(&json!({
        "physics": { "selected": true, "fee": -40, "classes": 0 },
        "math": { "selected": true, "fee": 10, "classes": -3 }
    }))
    .expect("aggregate");

    assert_eq!(out.courses.physics.fee, -40);
    assert_eq!(out.courses.physics.classes, 1);
    assert_eq!(out.courses.math.classes, 1);
    assert_eq!(out.total_amount, -30);
}

#[test]
fn aggregating_own_output_is_a_no_op() {
    let first = aggregate_courses(&json!({
        "physics": { "selected": true, "fee": "75", "classes": "2" },
        "chemistry": { "selected": true, "fee": 0 },
        "math": { "selected": false, "fee": 12, "classes": 3, "total": 36 },
        "computerScience": { "selected": true, "fee": 40 }
    }))
    .expect("first pass");

    let again = aggregate_courses(&serde_json::to_value(&first.courses).expect("to json"))
        .expect("second pass");
    assert_eq!(again, first);

    let subjects = aggregate_subjects(&json!({
        "biology": { "selected": true, "fee": "55" },
        "math": { "selected": false, "fee": 9 }
    }))
    .expect("subjects");
    let subjects_again =
        aggregate_subjects(&serde_json::to_value(&subjects.subjects).expect("to json"))
            .expect("subjects second pass");
    assert_eq!(subjects_again, subjects);
}

#[test]
fn teacher_subjects_sum_fees_without_class_multiplier() {
    let out = aggregate_subjects(&json!({
        "physics": { "selected": true, "fee": 200, "classes": 10 },
        "chemistry": { "selected": true, "fee": "150" },
        "math": { "selected": false, "fee": 500 }
    }))
    .expect("aggregate");

    assert_eq!(
        out.subjects.physics,
        SubjectFee {
            selected: true,
            fee: 200
        }
    );
    assert_eq!(out.subjects.chemistry.fee, 150);
    assert_eq!(out.subjects.math, SubjectFee::default());
    assert_eq!(out.total_fee, 350);
}

#[test]
fn unknown_subjects_and_bad_shapes_are_rejected() {
    assert_eq!(
        aggregate_courses(&json!({ "history": { "selected": true, "fee": 10 } })),
        Err(FeeError::UnknownSubject("history".to_string()))
    );
    assert_eq!(aggregate_courses(&json!([1, 2])), Err(FeeError::NotAnObject));
    assert_eq!(
        aggregate_courses(&json!({ "math": "yes" })),
        Err(FeeError::BadEntry("math"))
    );
    assert_eq!(
        aggregate_subjects(&json!({ "Physics": {} })),
        Err(FeeError::UnknownSubject("Physics".to_string()))
    );
}

#[test]
fn overflowing_totals_are_reported() {
    let err = aggregate_courses(&json!({
        "physics": { "selected": true, "fee": i64::MAX, "classes": 2 }
    }))
    .expect_err("overflow");
    assert_eq!(err, FeeError::Overflow("physics"));
}
