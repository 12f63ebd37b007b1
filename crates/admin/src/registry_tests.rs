// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use givc_core::test_support::{agent_entry, running_status, strategies};
use proptest::prelude::*;

fn app(name: &str) -> RegistryEntry {
    RegistryEntry::new(name, UnitType::AppVmApp).with_parent("givc-chrome-vm.service").with_watch(true)
}

#[test]
fn register_replaces_same_name() {
    let reg = Registry::new();
    reg.register(app("chrome@1.service"));
    let replacement = app("chrome@1.service").with_state(running_status("chrome@1.service"));
    reg.register(replacement.clone());

    assert_eq!(reg.len(), 1);
    assert_eq!(reg.get_by_name("chrome@1.service"), Some(replacement));
}

#[test]
fn deregister_missing_is_not_found() {
    let reg = Registry::new();
    assert_eq!(reg.deregister("nope"), Err(RegistryError::NotFound("nope".into())));
}

#[test]
fn deregister_leaves_children() {
    let reg = Registry::new();
    reg.register(agent_entry("chrome-vm", UnitType::AppVmMgr, "/run/chrome.sock"));
    reg.register(app("chrome@1.service"));
    reg.deregister("givc-chrome-vm.service").unwrap();
    assert!(reg.get_by_name("chrome@1.service").is_some());
}

#[test]
fn lookups_by_type_and_substring() {
    let reg = Registry::new();
    reg.register(agent_entry("chrome-vm", UnitType::AppVmMgr, "/run/chrome.sock"));
    reg.register(app("chrome@1.service"));
    reg.register(app("chrome@2.service"));
    reg.register(app("foot@1.service"));

    assert_eq!(reg.get_by_type(UnitType::AppVmApp).len(), 3);
    let names: Vec<_> = reg.get_by_substring("chrome@").into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["chrome@1.service", "chrome@2.service"]);
}

#[yare::parameterized(
    empty      = { &[], "chrome@1.service" },
    first_used = { &["chrome@1.service"], "chrome@2.service" },
    gap        = { &["chrome@1.service", "chrome@3.service"], "chrome@2.service" },
    case       = { &["CHROME@1.service"], "chrome@2.service" },
    other_base = { &["foot@1.service"], "chrome@1.service" },
)]
fn unique_instance_names(existing: &[&str], expected: &str) {
    let reg = Registry::new();
    for name in existing {
        reg.register(app(name));
    }
    assert_eq!(reg.unique_instance_name("chrome"), expected);
}

#[test]
fn watchlist_only_has_watched_entries() {
    let reg = Registry::new();
    reg.register(agent_entry("net-vm", UnitType::SysVmMgr, "/run/net.sock"));
    reg.register(RegistryEntry::new("microvm@net-vm.service", UnitType::SysVm));
    let watched: Vec<_> = reg.watchlist().into_iter().map(|e| e.name).collect();
    assert_eq!(watched, vec!["givc-net-vm.service"]);
}

#[test]
fn host_manager_lookup() {
    let reg = Registry::new();
    assert_eq!(reg.host_manager(), Err(RegistryError::NoHost));
    reg.register(agent_entry("ghaf-host", UnitType::HostMgr, "/run/host.sock"));
    assert_eq!(reg.host_manager().unwrap().name, "givc-ghaf-host.service");
    reg.register(agent_entry("second-host", UnitType::HostMgr, "/run/host2.sock"));
    assert_eq!(reg.host_manager(), Err(RegistryError::MultipleHosts));
}

#[test]
fn update_state_publishes_only_changes() {
    let reg = Registry::new();
    reg.register(app("foot@1.service"));
    let (_, mut rx) = reg.subscribe();

    reg.update_state("foot@1.service", running_status("foot@1.service")).unwrap();
    reg.update_state("foot@1.service", running_status("foot@1.service")).unwrap();

    assert!(matches!(rx.try_recv(), Ok(RegistryEvent::StatusChanged(e)) if e.state.is_running()));
    assert!(rx.try_recv().is_err());
    assert!(reg.update_state("missing", UnitStatus::default()).is_err());
}

#[test]
fn subscribe_sees_snapshot_then_changes() {
    let reg = Registry::new();
    reg.register(app("foot@1.service"));
    let (snapshot, mut rx) = reg.subscribe();
    assert_eq!(snapshot.len(), 1);

    reg.register(app("foot@1.service"));
    reg.deregister("foot@1.service").unwrap();

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(matches!(events[0], RegistryEvent::Replaced(_)));
    assert!(matches!(events[1], RegistryEvent::Registered(_)));
    assert!(matches!(events[2], RegistryEvent::Deregistered(_)));
    assert_eq!(events.len(), 3);
}

#[test]
fn concurrent_registration_keeps_names_unique() {
    let reg = Registry::new();
    std::thread::scope(|s| {
        for t in 0..8 {
            let reg = reg.clone();
            s.spawn(move || {
                for i in 0..50 {
                    reg.register(app(&format!("app{}@1.service", i % 10)));
                    if t % 2 == 0 {
                        let _ = reg.deregister(&format!("app{}@1.service", (i + 3) % 10));
                    }
                }
            });
        }
    });
    let mut names: Vec<_> = reg.entries().into_iter().map(|e| e.name).collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before);
}

proptest! {
    #[test]
    fn reregistration_keeps_size(entries in proptest::collection::vec(strategies::arb_entry(), 1..20)) {
        let reg = Registry::new();
        for e in &entries {
            reg.register(e.clone());
        }
        let mut unique: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(reg.len(), unique.len());

        let last = entries.last().unwrap().clone();
        let size = reg.len();
        reg.register(last.clone());
        prop_assert_eq!(reg.len(), size);
        prop_assert_eq!(reg.get_by_name(&last.name), Some(last));
    }

    #[test]
    fn unique_instance_name_is_never_registered(
        taken in proptest::collection::btree_set(1u32..12, 0..10),
    ) {
        let reg = Registry::new();
        for n in &taken {
            reg.register(app(&format!("foot@{}.service", n)));
        }
        let name = reg.unique_instance_name("foot");
        prop_assert!(reg.get_by_name(&name).is_none());
    }
}
