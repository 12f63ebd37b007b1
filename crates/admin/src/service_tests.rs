// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::orchestrator::OrchestratorConfig;
use crate::test_support::FakeFleet;
use futures_util::StreamExt;
use givc_core::test_support::agent_entry;
use givc_core::UnitType;
use givc_wire::pb::admin::watch_item::Status as WatchStatus;
use givc_wire::pb::locale as pb_locale;
use tonic::Code;

struct Fixture {
    rpc: AdminRpc,
    fleet: FakeFleet,
    shutdown: CancellationToken,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig {
        locale_file: dir.path().join("locale"),
        timezone_file: dir.path().join("timezone"),
        ..OrchestratorConfig::default()
    };
    let fleet = FakeFleet::default();
    let orch = Arc::new(Orchestrator::new(config, Arc::new(fleet.clone())));
    let shutdown = CancellationToken::new();
    Fixture { rpc: AdminRpc::new(orch, shutdown.clone()), fleet, shutdown, _dir: dir }
}

impl Fixture {
    async fn register(&self, vm: &str, ty: UnitType) {
        let entry = agent_entry(vm, ty, &format!("/run/givc/{}.sock", vm));
        self.fleet.agent(vm).set_running(&entry.name);
        self.rpc.register_service(Request::new(entry.into())).await.unwrap();
    }
}

fn app_request(app: &str, vm: Option<&str>) -> Request<ApplicationRequest> {
    Request::new(ApplicationRequest { app_name: app.into(), vm_name: vm.map(Into::into), args: vec![] })
}

#[tokio::test]
async fn register_rejects_unknown_unit_type() {
    let f = fixture();
    let mut req: RegistryRequest = agent_entry("gui-vm", UnitType::SysVmMgr, "/run/gui.sock").into();
    req.r#type = 99;

    let status = f.rpc.register_service(Request::new(req)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn start_application_reports_instance() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;
    f.register("chrome-vm", UnitType::AppVmMgr).await;

    let resp = f.rpc.start_application(app_request("chrome", None)).await.unwrap().into_inner();
    assert_eq!(resp.cmd_status, CMD_SUCCESS);
    assert_eq!(resp.app_status, "chrome@1.service");
}

#[tokio::test]
async fn empty_application_name_is_a_failed_command() {
    let f = fixture();
    let resp = f.rpc.start_application(app_request("", None)).await.unwrap().into_inner();
    assert_eq!(resp.cmd_status, CMD_FAILURE);
    assert!(resp.app_status.contains("application name is empty"), "{}", resp.app_status);
}

#[tokio::test]
async fn failed_start_reports_error_in_app_status() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;
    f.register("chrome-vm", UnitType::AppVmMgr).await;
    f.fleet.agent("chrome-vm").set_broken("chrome@1.service");

    let resp = f.rpc.start_application(app_request("chrome", None)).await.unwrap().into_inner();
    assert_eq!(resp.cmd_status, CMD_FAILURE);
    assert!(resp.app_status.contains("cannot start unit chrome@1.service"), "{}", resp.app_status);
}

#[tokio::test]
async fn empty_vm_name_means_default_vm() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;
    f.register("chrome-vm", UnitType::AppVmMgr).await;

    let resp = f.rpc.start_application(app_request("chrome", Some(""))).await.unwrap().into_inner();
    assert_eq!(resp.app_status, "chrome@1.service");
}

#[tokio::test]
async fn control_before_run_is_a_failed_command() {
    let f = fixture();
    let resp = f.rpc.pause_application(app_request("chrome", None)).await.unwrap().into_inner();
    assert_eq!(resp.cmd_status, CMD_FAILURE);
    assert!(resp.app_status.contains("register-host"), "{}", resp.app_status);
}

#[tokio::test]
async fn stop_application_succeeds_with_command_status() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;
    f.register("chrome-vm", UnitType::AppVmMgr).await;
    f.rpc.start_application(app_request("chrome", None)).await.unwrap();

    let resp = f.rpc.stop_application(app_request("chrome", None)).await.unwrap().into_inner();
    assert_eq!(resp.cmd_status, CMD_SUCCESS);
    assert_eq!(resp.app_status, "chrome@1.service");
}

#[tokio::test]
async fn control_on_unreachable_agent_is_a_failed_command() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;
    f.register("chrome-vm", UnitType::AppVmMgr).await;
    f.rpc.start_application(app_request("chrome", None)).await.unwrap();
    f.fleet.agent("chrome-vm").set_unreachable(true);

    let resp = f.rpc.pause_application(app_request("chrome", None)).await.unwrap().into_inner();
    assert_eq!(resp.cmd_status, CMD_FAILURE);
    assert!(resp.app_status.contains("agent unreachable"), "{}", resp.app_status);
}

#[tokio::test]
async fn wakeup_is_unimplemented() {
    let f = fixture();
    let status = f.rpc.wakeup(Request::new(Empty {})).await.unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
}

#[tokio::test]
async fn query_list_lists_registrations() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;
    f.register("gui-vm", UnitType::SysVmMgr).await;

    let list = f.rpc.query_list(Request::new(Empty {})).await.unwrap().into_inner().list;
    let names: Vec<_> = list.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["givc-ghaf-host.service", "givc-gui-vm.service"]);
    assert!(list.iter().all(|i| i.vm_status == crate::query::VM_RUNNING));
}

#[tokio::test]
async fn set_locale_rejects_bad_value() {
    let f = fixture();
    let req = LocaleRequest {
        assignments: vec![pb_locale::LocaleAssignment {
            key: pb_locale::LocaleMacroKey::Lang as i32,
            value: "en_US.UTF-8; rm -rf /".into(),
        }],
    };
    let status = f.rpc.set_locale(Request::new(req)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn set_timezone_accepts_valid_zone() {
    let f = fixture();
    let req = TimezoneRequest { timezone: "America/New_York".into() };
    f.rpc.set_timezone(Request::new(req)).await.unwrap();
}

#[tokio::test]
async fn watch_sends_snapshot_then_changes() {
    let f = fixture();
    f.register("ghaf-host", UnitType::HostMgr).await;

    let mut stream = f.rpc.watch(Request::new(Empty {})).await.unwrap().into_inner();
    match stream.next().await.unwrap().unwrap().status {
        Some(WatchStatus::Initial(list)) => assert_eq!(list.list.len(), 1),
        other => panic!("expected initial snapshot, got {:?}", other),
    }

    f.register("gui-vm", UnitType::SysVmMgr).await;
    match stream.next().await.unwrap().unwrap().status {
        Some(WatchStatus::Added(item)) => assert_eq!(item.name, "givc-gui-vm.service"),
        other => panic!("expected added item, got {:?}", other),
    }

    f.shutdown.cancel();
    assert!(stream.next().await.is_none());
}
