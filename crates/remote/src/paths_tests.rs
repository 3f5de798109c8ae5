// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    posix_absolute = { "/opt/engines", "dummy", "debian-11", "/opt/engines/dummy" },
    posix_relative = { "engines", "dummy", "debian-11", "engines/dummy" },
    windows_absolute = { "C:\\engines", "dummy", "windows-11", "C:\\engines\\dummy" },
    windows_relative = { "engines", "dummy", "windows-11", "engines\\dummy" },
    trailing_slash_trimmed = { "/opt/engines/", "dummy", "debian-11", "/opt/engines/dummy" },
)]
fn joins_with_platform_appropriate_separator(base: &str, segment: &str, platform: &str, expected: &str) {
    assert_eq!(join(base, segment, platform), expected);
}

#[test]
fn detects_windows_platform_by_prefix() {
    assert!(is_windows("windows-10"));
    assert!(!is_windows("debian-11"));
}

#[test]
fn posix_absolute_path_is_detected() {
    assert!(is_absolute("/opt/engines", "debian-11"));
    assert!(!is_absolute("engines", "debian-11"));
}

#[test]
fn windows_absolute_path_is_detected() {
    assert!(is_absolute("C:\\engines", "windows-10"));
    assert!(!is_absolute("engines", "windows-10"));
}
