// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn linux_tag_composes_id_and_version() {
    let os_release = "NAME=\"Debian GNU/Linux\"\nID=debian\nVERSION_ID=\"11\"\n";
    assert_eq!(linux_tag(os_release), "debian-11");
}

#[test]
fn linux_tag_falls_back_to_bare_id_without_version() {
    let os_release = "ID=arch\n";
    assert_eq!(linux_tag(os_release), "arch");
}

#[test]
fn linux_tag_falls_back_to_linux_when_empty() {
    assert_eq!(linux_tag(""), "linux");
}

#[test]
fn macos_tag_keeps_major_version_only() {
    assert_eq!(macos_tag("13.4\n"), "macos-13");
}

#[test]
fn macos_tag_falls_back_when_unparseable() {
    assert_eq!(macos_tag(""), "macos");
}

#[test]
fn windows_tag_reports_10_below_build_22000() {
    assert_eq!(windows_tag("Microsoft Windows [Version 10.0.19045.2965]"), "windows-10");
}

#[test]
fn windows_tag_reports_11_at_or_above_build_22000() {
    assert_eq!(windows_tag("Microsoft Windows [Version 10.0.22621.963]"), "windows-11");
}

#[test]
fn windows_tag_falls_back_when_unparseable() {
    assert_eq!(windows_tag("garbage"), "windows");
}
