// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry views for `QueryList` and `Watch`.

use givc_core::{vm_from_agent_service, vm_from_vm_service, RegistryEntry, UnitClass};
use givc_wire::pb::admin::watch_item::Status as WatchStatus;
use givc_wire::pb::admin::{QueryListItem, QueryListResponse, WatchItem};

use crate::registry::{Registry, RegistryEvent};

pub const VM_RUNNING: &str = "Running";
pub const VM_PAUSED: &str = "Paused";
pub const VM_POWERED_OFF: &str = "PoweredOff";

/// Trust levels are not tracked yet; every entry reports the neutral level.
pub const DEFAULT_TRUST_LEVEL: &str = "Warning";

pub fn query_item(entry: &RegistryEntry) -> QueryListItem {
    let vm_status = if entry.state.is_paused() {
        VM_PAUSED
    } else if entry.state.is_running() {
        VM_RUNNING
    } else {
        VM_POWERED_OFF
    };
    QueryListItem {
        name: entry.name.clone(),
        description: entry.state.description.clone(),
        vm_status: vm_status.to_string(),
        trust_level: DEFAULT_TRUST_LEVEL.to_string(),
        vm_type: entry.unit_type.vm_class().to_string(),
        service_type: entry.unit_type.unit_class().to_string(),
        vm_name: vm_name(entry),
        agent_name: agent_name(entry),
    }
}

fn agent_name(entry: &RegistryEntry) -> Option<String> {
    if entry.unit_type.is_manager() {
        Some(entry.name.clone())
    } else if entry.has_parent() {
        Some(entry.parent.clone())
    } else {
        None
    }
}

fn vm_name(entry: &RegistryEntry) -> Option<String> {
    match entry.unit_type.unit_class() {
        UnitClass::Vm => vm_from_vm_service(&entry.name).map(str::to_string),
        UnitClass::Manager => vm_from_agent_service(&entry.name).map(str::to_string),
        UnitClass::Service | UnitClass::Application => {
            vm_from_agent_service(&entry.parent).map(str::to_string)
        }
    }
}

pub fn query_list(registry: &Registry) -> QueryListResponse {
    QueryListResponse { list: registry.entries().iter().map(query_item).collect() }
}

pub fn initial_item(entries: &[RegistryEntry]) -> WatchItem {
    let list = entries.iter().map(query_item).collect();
    WatchItem { status: Some(WatchStatus::Initial(QueryListResponse { list })) }
}

/// Watch item for a registry change. A replaced entry is reported as removed;
/// its successor follows as added.
pub fn watch_item(event: &RegistryEvent) -> WatchItem {
    let item = query_item(event.entry());
    let status = match event {
        RegistryEvent::Registered(_) => WatchStatus::Added(item),
        RegistryEvent::StatusChanged(_) => WatchStatus::Updated(item),
        RegistryEvent::Replaced(_) | RegistryEvent::Deregistered(_) => WatchStatus::Removed(item),
    };
    WatchItem { status: Some(status) }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
