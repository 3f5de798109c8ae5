// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placeholder substitution for engine spawn command templates.
//!
//! §4.6: "Placeholder substitution is strict: unrecognized placeholders in
//! a spawn template cause the task to be failed at submission validation
//! time, never at dispatch time." [`placeholders_in`] backs both call
//! sites (submission-time validation in [`crate::engine_def::EngineDef::new`]
//! and dispatch-time rendering here) so they can never disagree on the
//! recognized set.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpawnTemplateError {
    #[error("unknown placeholder '{0}' in spawn template")]
    UnknownPlaceholder(String),
}

/// Extract every `{name}` placeholder appearing in `template`, in order of
/// first appearance, without deduplicating.
pub fn placeholders_in(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = template.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '{' {
            continue;
        }
        let mut name = String::new();
        for (_, c2) in chars.by_ref() {
            if c2 == '}' {
                break;
            }
            name.push(c2);
        }
        if !name.is_empty() {
            out.push(name);
        }
    }
    out
}

/// Validate that every placeholder in `template` is in `known`. Used at
/// submission time so a bad engine spawn template fails the submit, not a
/// later dispatch (§4.6, S6).
pub fn validate_placeholders(template: &str, known: &[&str]) -> Result<(), SpawnTemplateError> {
    for placeholder in placeholders_in(template) {
        if !known.contains(&placeholder.as_str()) {
            return Err(SpawnTemplateError::UnknownPlaceholder(placeholder));
        }
    }
    Ok(())
}

/// Render a spawn template against a fixed set of values. Every placeholder
/// in the template must already have been validated by
/// [`validate_placeholders`]; missing values here indicate a bug upstream,
/// not untrusted input, so they are left verbatim rather than erroring.
pub fn render_template(template: &str, values: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        for (_, c2) in chars.by_ref() {
            if c2 == '}' {
                closed = true;
                break;
            }
            name.push(c2);
        }
        if !closed {
            out.push('{');
            out.push_str(&name);
            continue;
        }
        match values.get(name.as_str()) {
            Some(v) => out.push_str(v),
            None => {
                out.push('{');
                out.push_str(&name);
                out.push('}');
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
