// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::orchestrator::OrchestratorConfig;
use crate::test_support::{stopped_status, FakeFleet};
use givc_core::test_support::agent_entry;
use givc_core::AppRef;

const HOST: &str = "ghaf-host";

async fn setup() -> (Arc<Orchestrator>, FakeFleet, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig {
        vm_startup_time: Duration::from_secs(1),
        locale_file: dir.path().join("locale"),
        timezone_file: dir.path().join("timezone"),
        ..OrchestratorConfig::default()
    };
    let fleet = FakeFleet::default();
    let orch = Arc::new(Orchestrator::new(config, Arc::new(fleet.clone())));
    for (vm, ty) in [(HOST, UnitType::HostMgr), ("chrome-vm", UnitType::AppVmMgr)] {
        let entry = agent_entry(vm, ty, &format!("/run/givc/{}.sock", vm));
        fleet.agent(vm).set_running(&entry.name);
        orch.register_service(entry).await.unwrap();
    }
    (orch, fleet, dir)
}

#[tokio::test]
async fn healthy_sweep_checks_every_watched_entry() {
    let (orch, _fleet, _dir) = setup().await;
    orch.start_application(&AppRef::parse("chrome"), &[]).await.unwrap();

    let outcome = Monitor::new(orch.clone()).sweep().await;
    assert_eq!(outcome, Sweep::Healthy { checked: 3 });
}

#[tokio::test]
async fn sweep_refreshes_stored_status() {
    let (orch, fleet, _dir) = setup().await;
    orch.start_application(&AppRef::parse("chrome"), &[]).await.unwrap();
    let mut status = fleet.agent("chrome-vm").unit("chrome@1.service").unwrap();
    status.description = "Chromium browser".into();
    fleet.agent("chrome-vm").set_unit(status);

    Monitor::new(orch.clone()).sweep().await;
    let stored = orch.registry().get_by_name("chrome@1.service").unwrap();
    assert_eq!(stored.state.description, "Chromium browser");
}

#[tokio::test]
async fn dead_application_is_deregistered() {
    let (orch, fleet, _dir) = setup().await;
    orch.start_application(&AppRef::parse("chrome"), &[]).await.unwrap();
    fleet.agent("chrome-vm").set_unit(stopped_status("chrome@1.service"));

    let outcome = Monitor::new(orch.clone()).sweep().await;
    assert_eq!(outcome, Sweep::Aborted { name: "chrome@1.service".into() });
    assert!(orch.registry().get_by_name("chrome@1.service").is_none());
}

#[tokio::test(start_paused = true)]
async fn unreachable_vm_agent_restarts_vm() {
    let (orch, fleet, _dir) = setup().await;
    let host = fleet.agent(HOST);
    host.set_unit(stopped_status("microvm@chrome-vm.service"));
    fleet.agent("chrome-vm").set_unreachable(true);

    let outcome = Monitor::new(orch.clone()).sweep().await;
    assert_eq!(outcome, Sweep::Aborted { name: "givc-chrome-vm.service".into() });
    assert!(host.calls().contains(&"start microvm@chrome-vm.service".to_string()));
    // The manager stays registered until it re-registers after boot
    assert!(orch.registry().get_by_name("givc-chrome-vm.service").is_some());
}

#[tokio::test]
async fn first_failure_ends_the_sweep() {
    let (orch, fleet, _dir) = setup().await;
    let app = AppRef::parse("chrome");
    orch.start_application(&app, &[]).await.unwrap();
    orch.start_application(&app, &[]).await.unwrap();
    let agent = fleet.agent("chrome-vm");
    agent.set_unit(stopped_status("chrome@1.service"));
    agent.set_unit(stopped_status("chrome@2.service"));

    let monitor = Monitor::new(orch.clone());
    assert_eq!(monitor.sweep().await, Sweep::Aborted { name: "chrome@1.service".into() });
    assert!(orch.registry().get_by_name("chrome@2.service").is_some());

    assert_eq!(monitor.sweep().await, Sweep::Aborted { name: "chrome@2.service".into() });
    assert_eq!(monitor.sweep().await, Sweep::Healthy { checked: 2 });
}

#[tokio::test]
async fn failed_host_is_only_logged() {
    let (orch, fleet, _dir) = setup().await;
    fleet.agent(HOST).set_unreachable(true);

    let outcome = Monitor::new(orch.clone()).sweep().await;
    assert_eq!(outcome, Sweep::Aborted { name: "givc-ghaf-host.service".into() });
    assert!(orch.registry().get_by_name("givc-ghaf-host.service").is_some());
}

#[tokio::test(start_paused = true)]
async fn run_sweeps_on_interval_until_cancelled() {
    let (orch, fleet, _dir) = setup().await;
    orch.start_application(&AppRef::parse("chrome"), &[]).await.unwrap();
    fleet.agent("chrome-vm").set_unit(stopped_status("chrome@1.service"));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(Monitor::new(orch.clone()).run(cancel.clone()));

    tokio::time::sleep(WATCH_INTERVAL / 2).await;
    assert!(orch.registry().get_by_name("chrome@1.service").is_some());

    tokio::time::sleep(WATCH_INTERVAL).await;
    assert!(orch.registry().get_by_name("chrome@1.service").is_none());

    cancel.cancel();
    task.await.unwrap();
}
