// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;
use tonic::Code;

fn add_iface(dir: &TempDir, name: &str, flags: &str, mac: &str) {
    let path = dir.path().join(name);
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("flags"), format!("{}\n", flags)).unwrap();
    std::fs::write(path.join("address"), format!("{}\n", mac)).unwrap();
}

fn sys_net() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    add_iface(&dir, "lo", "0x9", "00:00:00:00:00:00");
    add_iface(&dir, "enp0s3", "0x1043", "52:54:00:12:34:56");
    dir
}

#[test]
fn prefers_wireless_interface() {
    let dir = sys_net();
    add_iface(&dir, "wlp0s5", "0x1043", "02:00:00:aa:bb:cc");
    let hwid = HwidRpc::new("").with_sys_net(dir.path());
    assert_eq!(hwid.identifier().unwrap(), "02:00:00:aa:bb:cc");
}

#[test]
fn falls_back_to_ethernet() {
    let dir = sys_net();
    let hwid = HwidRpc::new("").with_sys_net(dir.path());
    assert_eq!(hwid.identifier().unwrap(), "52:54:00:12:34:56");
}

#[test]
fn configured_interface_wins() {
    let dir = sys_net();
    add_iface(&dir, "wlp0s5", "0x1043", "02:00:00:aa:bb:cc");
    let hwid = HwidRpc::new("enp0s3").with_sys_net(dir.path());
    assert_eq!(hwid.identifier().unwrap(), "52:54:00:12:34:56");
}

#[test]
fn interface_that_is_down_is_rejected() {
    let dir = sys_net();
    add_iface(&dir, "wlan0", "0x1003", "02:00:00:aa:bb:cc");
    let hwid = HwidRpc::new("").with_sys_net(dir.path());
    let err = hwid.identifier().unwrap_err();
    assert!(matches!(err, HwidError::NotRunning(ref i) if i == "wlan0"));
    assert_eq!(Status::from(err).code(), Code::FailedPrecondition);
}

#[test]
fn no_candidate_interface() {
    let dir = tempfile::tempdir().unwrap();
    add_iface(&dir, "lo", "0x9", "00:00:00:00:00:00");
    let err = HwidRpc::new("").with_sys_net(dir.path()).identifier().unwrap_err();
    assert_eq!(Status::from(err).code(), Code::NotFound);
}

#[test]
fn missing_configured_interface_is_internal() {
    let dir = sys_net();
    let err = HwidRpc::new("wlan9").with_sys_net(dir.path()).identifier().unwrap_err();
    assert!(matches!(err, HwidError::Read { .. }));
}

#[tokio::test]
async fn rpc_returns_identifier() {
    let dir = sys_net();
    let hwid = HwidRpc::new("").with_sys_net(dir.path());
    let resp = hwid.get_hw_id(Request::new(HwIdRequest {})).await.unwrap().into_inner();
    assert_eq!(resp.identifier, "52:54:00:12:34:56");
}
