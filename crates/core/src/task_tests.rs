// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn status_round_trips_through_code() {
    for status in [TaskStatus::ToDo, TaskStatus::Running, TaskStatus::Done] {
        assert_eq!(TaskStatus::from_code(status.code()), Some(status));
    }
}

#[test]
fn unknown_status_code_is_none() {
    assert_eq!(TaskStatus::from_code(9), None);
}

#[test]
fn status_display_matches_wire_names() {
    assert_eq!(TaskStatus::ToDo.to_string(), "TO_DO");
    assert_eq!(TaskStatus::Running.to_string(), "RUNNING");
    assert_eq!(TaskStatus::Done.to_string(), "DONE");
}

#[test]
fn metadata_serializes_without_errors_field_when_absent() {
    let meta = TaskMetadata::new("dummy".to_string(), vec!["1.input".into()], vec!["1.input.out".into()]);
    let json = serde_json::to_value(&meta).unwrap();
    assert!(json.get("errors").is_none());
}

#[test]
fn metadata_round_trips_with_extra_fields() {
    let mut meta = TaskMetadata::new("dummy".to_string(), vec![], vec![]);
    meta.extra.insert("note".to_string(), serde_json::json!("hi"));
    let json = serde_json::to_string(&meta).unwrap();
    let back: TaskMetadata = serde_json::from_str(&json).unwrap();
    assert_eq!(back.extra.get("note"), Some(&serde_json::json!("hi")));
}

#[test]
fn task_id_display_is_bare_integer() {
    assert_eq!(TaskId::new(42).to_string(), "42");
}
