// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn placeholders_in_extracts_all_names_in_order() {
    let found = placeholders_in("{engine_path}/run {task_path}/1.input -n {ncpus}");
    assert_eq!(found, vec!["engine_path", "task_path", "ncpus"]);
}

#[test]
fn placeholders_in_ignores_braces_with_no_name() {
    assert_eq!(placeholders_in("echo {} done"), Vec::<String>::new());
}

#[test]
fn validate_placeholders_accepts_known_set() {
    assert!(validate_placeholders("{task_path}/run", &["task_path", "engine_path"]).is_ok());
}

#[test]
fn validate_placeholders_rejects_unknown() {
    let err = validate_placeholders("{nonsense} file", &["task_path"]).unwrap_err();
    assert_eq!(err, SpawnTemplateError::UnknownPlaceholder("nonsense".into()));
}

#[test]
fn render_template_substitutes_known_values() {
    let mut values = BTreeMap::new();
    values.insert("task_path", "/home/root/tasks/1".to_string());
    values.insert("engine_path", "/home/root/engines/dummy".to_string());
    values.insert("ncpus", "4".to_string());
    let rendered = render_template("{engine_path}/run {task_path}/1.input -n {ncpus}", &values);
    assert_eq!(rendered, "/home/root/engines/dummy/run /home/root/tasks/1/1.input -n 4");
}

#[test]
fn render_template_leaves_unmatched_placeholder_verbatim() {
    let values = BTreeMap::new();
    let rendered = render_template("{task_path}/run", &values);
    assert_eq!(rendered, "{task_path}/run");
}
