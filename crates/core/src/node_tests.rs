// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_dotted_ipv4() {
    let ip = NodeIp::parse("10.0.0.1").unwrap();
    assert_eq!(ip.to_string(), "10.0.0.1");
}

#[test]
fn rejects_non_ip_strings() {
    assert!(NodeIp::parse("not-an-ip").is_err());
}

#[test]
fn static_node_has_no_cloud_tag() {
    let ip = NodeIp::parse("10.0.0.1").unwrap();
    let node = Node::new_static(ip, "root");
    assert!(!node.is_cloud_owned());
    assert!(node.enabled);
}

#[test]
fn cloud_node_is_tagged_and_owned() {
    let ip = NodeIp::parse("10.0.0.2").unwrap();
    let node = Node::new_cloud(ip, "root", "openstack-a");
    assert!(node.is_cloud_owned());
    assert_eq!(node.cloud.as_deref(), Some("openstack-a"));
}

#[test]
fn node_serializes_ip_as_plain_string() {
    let ip = NodeIp::parse("10.0.0.1").unwrap();
    let node = Node::new_static(ip, "root");
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["ip"], "10.0.0.1");
}
