// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn task_builder_defaults_are_valid() {
    let task = Task::builder().build();
    assert_eq!(task.status, TaskStatus::ToDo);
    assert!(task.ip.is_none());
}

#[test]
fn task_builder_overrides_apply() {
    let task = Task::builder().id(TaskId::new(7)).label("custom").status(TaskStatus::Running).ip("10.0.0.5").build();
    assert_eq!(task.id, TaskId::new(7));
    assert_eq!(task.label, "custom");
    assert_eq!(task.status, TaskStatus::Running);
    assert_eq!(task.ip.as_deref(), Some("10.0.0.5"));
}

#[test]
fn node_builder_defaults_are_enabled_and_static() {
    let node = Node::builder().build();
    assert!(node.enabled);
    assert!(node.cloud.is_none());
}

#[test]
fn dummy_engine_def_is_constructible() {
    let def = dummy_engine_def();
    assert_eq!(def.name, "dummy");
    assert!(def.supports_platform("debian-11"));
}
