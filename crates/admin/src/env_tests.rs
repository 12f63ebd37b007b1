// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use yare::parameterized;

#[parameterized(
    commas = { "gui-vm,net-vm", &["gui-vm", "net-vm"] },
    spaces = { "gui-vm net-vm", &["gui-vm", "net-vm"] },
    mixed = { " gui-vm, ,net-vm ", &["gui-vm", "net-vm"] },
    empty = { "", &[] },
)]
fn splits_module_lists(input: &str, expected: &[&str]) {
    assert_eq!(split_list(input), expected);
}

#[test]
#[serial]
fn log_dir_ignores_empty_value() {
    std::env::set_var("GIVC_LOG_DIR", "");
    assert_eq!(log_dir(), None);
    std::env::set_var("GIVC_LOG_DIR", "/var/log/givc");
    assert_eq!(log_dir(), Some(PathBuf::from("/var/log/givc")));
    std::env::remove_var("GIVC_LOG_DIR");
}
