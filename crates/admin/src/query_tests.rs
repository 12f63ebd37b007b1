// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use givc_core::test_support::{agent_entry, running_status};
use givc_core::{UnitStatus, UnitType};
use yare::parameterized;

fn app_entry(state: UnitStatus) -> RegistryEntry {
    RegistryEntry::new("chrome@1.service", UnitType::AppVmApp)
        .with_parent("givc-chrome-vm.service")
        .with_state(state)
        .with_watch(true)
}

fn frozen(name: &str) -> UnitStatus {
    UnitStatus { freezer_state: "frozen".into(), ..running_status(name) }
}

#[parameterized(
    running = { running_status("chrome@1.service"), VM_RUNNING },
    paused = { frozen("chrome@1.service"), VM_PAUSED },
    dead = { UnitStatus::exited("chrome@1.service"), VM_POWERED_OFF },
    unknown = { UnitStatus::default(), VM_POWERED_OFF },
)]
fn vm_status_from_unit_state(state: UnitStatus, expected: &str) {
    assert_eq!(query_item(&app_entry(state)).vm_status, expected);
}

#[test]
fn application_item_names_vm_and_agent() {
    let item = query_item(&app_entry(running_status("chrome@1.service")));
    assert_eq!(item.name, "chrome@1.service");
    assert_eq!(item.vm_type, "AppVM");
    assert_eq!(item.service_type, "App");
    assert_eq!(item.trust_level, DEFAULT_TRUST_LEVEL);
    assert_eq!(item.vm_name.as_deref(), Some("chrome-vm"));
    assert_eq!(item.agent_name.as_deref(), Some("givc-chrome-vm.service"));
}

#[test]
fn manager_is_its_own_agent() {
    let item = query_item(&agent_entry("gui-vm", UnitType::SysVmMgr, "/run/gui.sock"));
    assert_eq!(item.vm_name.as_deref(), Some("gui-vm"));
    assert_eq!(item.agent_name.as_deref(), Some("givc-gui-vm.service"));
    assert_eq!(item.service_type, "Mgr");
}

#[test]
fn vm_unit_is_named_from_microvm_service() {
    let entry = RegistryEntry::new("microvm@net-vm.service", UnitType::SysVm).with_parent("givc-ghaf-host.service");
    let item = query_item(&entry);
    assert_eq!(item.vm_name.as_deref(), Some("net-vm"));
    assert_eq!(item.agent_name.as_deref(), Some("givc-ghaf-host.service"));
}

#[test]
fn orphan_service_has_no_vm_or_agent() {
    let item = query_item(&RegistryEntry::new("audio.service", UnitType::SysVmSvc));
    assert_eq!(item.vm_name, None);
    assert_eq!(item.agent_name, None);
}

#[test]
fn query_list_follows_registration_order() {
    let registry = Registry::new();
    registry.register(agent_entry("ghaf-host", UnitType::HostMgr, "/run/host.sock"));
    registry.register(app_entry(running_status("chrome@1.service")));

    let names: Vec<_> = query_list(&registry).list.into_iter().map(|i| i.name).collect();
    assert_eq!(names, ["givc-ghaf-host.service", "chrome@1.service"]);
}

#[test]
fn initial_item_wraps_snapshot() {
    let entries = vec![app_entry(running_status("chrome@1.service"))];
    match initial_item(&entries).status {
        Some(WatchStatus::Initial(list)) => assert_eq!(list.list.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn registry_events_map_to_watch_status() {
    let entry = app_entry(running_status("chrome@1.service"));
    let cases = [
        (RegistryEvent::Registered(entry.clone()), "added"),
        (RegistryEvent::StatusChanged(entry.clone()), "updated"),
        (RegistryEvent::Replaced(entry.clone()), "removed"),
        (RegistryEvent::Deregistered(entry), "removed"),
    ];
    for (event, expected) in cases {
        let kind = match watch_item(&event).status {
            Some(WatchStatus::Added(_)) => "added",
            Some(WatchStatus::Updated(_)) => "updated",
            Some(WatchStatus::Removed(_)) => "removed",
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(kind, expected, "{:?}", event);
    }
}
