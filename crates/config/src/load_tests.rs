// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;
use yascheduler_core::{DeploySource, LivenessCheck};

fn write_conf(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

const MINIMAL: &str = r#"
[db]
host = localhost
port = 5432
database = yascheduler
user = yascheduler

[local]
data_dir = /var/lib/yascheduler
keys_dir = %(data_dir)s/keys
engines_dir = %(data_dir)s/engines

[remote]
engines_dir = engines
tasks_dir = tasks

[engine.dummy]
platforms = debian-11
deploy_local_files = dummyengine
spawn = {engine_path}/dummyengine {task_path}/1.input
check_pname = dummyengine
sleep_interval = 1
input_files = 1.input
output_files = 1.input.out
"#;

#[test]
fn parses_minimal_config() {
    let file = write_conf(MINIMAL);
    let cfg = Config::load_from_path(file.path()).expect("loads");

    assert_eq!(cfg.db.host, "localhost");
    assert_eq!(cfg.db.port, 5432);
    assert_eq!(cfg.db.connection_url(), "postgres://yascheduler:@localhost:5432/yascheduler");
    assert!(cfg.clouds.is_empty());
    assert_eq!(cfg.engines.len(), 1);
    assert!(cfg.unknown_keys.is_empty());
}

#[test]
fn interpolates_within_section() {
    let file = write_conf(MINIMAL);
    let cfg = Config::load_from_path(file.path()).expect("loads");
    assert_eq!(cfg.local.keys_dir, "/var/lib/yascheduler/keys");
    assert_eq!(cfg.local.engines_dir, "/var/lib/yascheduler/engines");
}

#[test]
fn engine_deploy_source_and_check_parse() {
    let file = write_conf(MINIMAL);
    let cfg = Config::load_from_path(file.path()).expect("loads");
    let dummy = &cfg.engines["dummy"];
    assert_eq!(dummy.deploy, DeploySource::LocalFiles { files: vec!["dummyengine".to_string()] });
    assert_eq!(dummy.check, LivenessCheck::ProcessName { pname: "dummyengine".to_string() });
}

#[test]
fn missing_section_is_fatal() {
    let file = write_conf("[db]\nhost = localhost\ndatabase = x\nuser = y\n");
    let err = Config::load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingSection(s) if s == "local"));
}

#[test]
fn unknown_key_is_collected_not_fatal() {
    let conf = MINIMAL.replacen("host = localhost", "host = localhost\nbogus_key = 1", 1);
    let file = write_conf(&conf);
    let cfg = Config::load_from_path(file.path()).expect("loads despite unknown key");
    assert_eq!(
        cfg.unknown_keys,
        vec![UnknownKey { section: "db".to_string(), key: "bogus_key".to_string() }]
    );
}

#[yare::parameterized(
    both_sources = {
        "deploy_local_files = a\ndeploy_local_archive = b.tar.gz",
        "deploy",
    },
    neither_source = {
        "",
        "deploy",
    },
    both_checks = {
        "check_pname = x\ncheck_cmd = y",
        "check",
    },
)]
fn engine_mutual_exclusion_is_rejected(extra_lines: &str, which: &str) {
    let base = r#"
[db]
host = localhost
database = yascheduler
user = yascheduler

[local]
data_dir = /tmp
keys_dir = /tmp/keys
engines_dir = /tmp/engines

[remote]
engines_dir = engines
tasks_dir = tasks

[engine.dummy]
platforms = debian-11
spawn = {engine_path}/run
"#;
    let conf = format!("{base}\n{extra_lines}\n");
    let file = write_conf(&conf);
    let err = Config::load_from_path(file.path()).unwrap_err();
    match which {
        "deploy" => assert!(matches!(err, ConfigError::AmbiguousDeploySource(_))),
        "check" => assert!(matches!(err, ConfigError::AmbiguousLivenessCheck(_))),
        _ => unreachable!(),
    }
}

#[test]
fn cloud_section_parses_openstack() {
    let conf = format!(
        "{MINIMAL}\n[cloud.hetzner]\nkind = openstack\nauth_url = https://example/v3\nos_user = u\nos_password = p\nos_project = proj\nimage = img\nflavor = small\nmax_nodes = 5\npriority = 10\nidle_tolerance = 120\n"
    );
    let file = write_conf(&conf);
    let cfg = Config::load_from_path(file.path()).expect("loads");
    assert_eq!(cfg.clouds.len(), 1);
    let cloud = &cfg.clouds[0];
    assert_eq!(cloud.name, "hetzner");
    assert_eq!(cloud.max_nodes, 5);
    assert_eq!(cloud.priority, 10);
    assert_eq!(cloud.idle_tolerance, std::time::Duration::from_secs(120));
    assert!(matches!(cloud.kind, CloudKind::OpenStack { .. }));
}

#[test]
fn cloud_with_max_nodes_zero_is_disabled() {
    let conf = format!(
        "{MINIMAL}\n[cloud.disabled]\nkind = script\ncreate_cmd = /bin/true\ndelete_cmd = /bin/true\nlist_cmd = /bin/true\nmax_nodes = 0\n"
    );
    let file = write_conf(&conf);
    let cfg = Config::load_from_path(file.path()).expect("loads");
    assert_eq!(cfg.clouds.len(), 1);
    assert!(!cfg.clouds[0].is_enabled());
    assert!(cfg.clouds_by_priority().is_empty());
}

#[test]
fn clouds_by_priority_orders_descending_with_name_tiebreak() {
    let conf = format!(
        "{MINIMAL}\n\
         [cloud.b]\nkind = script\ncreate_cmd = x\ndelete_cmd = x\nlist_cmd = x\nmax_nodes = 1\npriority = 5\n\
         [cloud.a]\nkind = script\ncreate_cmd = x\ndelete_cmd = x\nlist_cmd = x\nmax_nodes = 1\npriority = 5\n\
         [cloud.top]\nkind = script\ncreate_cmd = x\ndelete_cmd = x\nlist_cmd = x\nmax_nodes = 1\npriority = 10\n"
    );
    let file = write_conf(&conf);
    let cfg = Config::load_from_path(file.path()).expect("loads");
    let ordered: Vec<&str> = cfg.clouds_by_priority().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(ordered, vec!["top", "a", "b"]);
}

#[test]
fn jump_host_requires_both_keys() {
    let conf = format!("{MINIMAL}\n[cloud.x]\nkind = script\ncreate_cmd = a\ndelete_cmd = a\nlist_cmd = a\nmax_nodes = 1\njump_user = bastion\n");
    let file = write_conf(&conf);
    let err = Config::load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "jump_host"));
}
