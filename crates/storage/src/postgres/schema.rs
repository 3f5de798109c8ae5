// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DDL for the two tables of §6, verbatim. Used by the `yainit` admin CLI
//! and by integration test setup; not run automatically by the daemon.

pub const CREATE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS yascheduler_nodes (
    ip VARCHAR(15) UNIQUE NOT NULL,
    ncpus SMALLINT NULL,
    enabled BOOL NOT NULL DEFAULT TRUE,
    cloud VARCHAR(32) NULL,
    username VARCHAR(255) NOT NULL DEFAULT 'root'
)
"#;

pub const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS yascheduler_tasks (
    task_id SERIAL PRIMARY KEY,
    label VARCHAR(256) NOT NULL,
    metadata JSONB NOT NULL,
    ip VARCHAR(15) NULL,
    status SMALLINT NOT NULL DEFAULT 0
)
"#;

pub const CREATE_TASKS_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS yascheduler_tasks_status_idx ON yascheduler_tasks (status)";
