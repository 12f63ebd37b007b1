// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fleet directory.
//!
//! Every mutation runs under one exclusive lock and publishes a
//! [`RegistryEvent`]. Lookups copy entries out so callers never hold the lock
//! across an RPC.

use std::sync::Arc;

use givc_core::{RegistryEntry, UnitStatus, UnitType};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Buffered change events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} not registered")]
    NotFound(String),
    #[error("host manager not registered")]
    NoHost,
    #[error("more than one host manager registered")]
    MultipleHosts,
}

/// A change to the registry contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered(RegistryEntry),
    /// Previous entry dropped by a re-registration; followed by `Registered`
    Replaced(RegistryEntry),
    Deregistered(RegistryEntry),
    StatusChanged(RegistryEntry),
}

impl RegistryEvent {
    pub fn entry(&self) -> &RegistryEntry {
        match self {
            RegistryEvent::Registered(e)
            | RegistryEvent::Replaced(e)
            | RegistryEvent::Deregistered(e)
            | RegistryEvent::StatusChanged(e) => e,
        }
    }
}

/// Shared handle to the registry. Clones refer to the same entries.
#[derive(Clone)]
pub struct Registry {
    entries: Arc<Mutex<Vec<RegistryEntry>>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_list().entries(entries.iter().map(|e| &e.name)).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { entries: Arc::new(Mutex::new(Vec::new())), events }
    }

    fn publish(&self, event: RegistryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Insert `entry`, replacing any entry with the same name.
    pub fn register(&self, entry: RegistryEntry) {
        let mut entries = self.entries.lock();
        if let Some(pos) = entries.iter().position(|e| e.name == entry.name) {
            let old = entries.remove(pos);
            debug!(name = %old.name, "replacing registry entry");
            self.publish(RegistryEvent::Replaced(old));
        }
        info!(name = %entry.name, ty = %entry.unit_type, parent = %entry.parent, "registered");
        entries.push(entry.clone());
        self.publish(RegistryEvent::Registered(entry));
    }

    /// Remove `name`. Children are left in place.
    pub fn deregister(&self, name: &str) -> Result<RegistryEntry, RegistryError> {
        let mut entries = self.entries.lock();
        let pos = entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let old = entries.remove(pos);
        info!(name = %old.name, "deregistered");
        self.publish(RegistryEvent::Deregistered(old.clone()));
        Ok(old)
    }

    /// Replace the stored status of `name`.
    pub fn update_state(&self, name: &str, state: UnitStatus) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if entry.state != state {
            entry.state = state;
            self.publish(RegistryEvent::StatusChanged(entry.clone()));
        }
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Option<RegistryEntry> {
        self.entries.lock().iter().find(|e| e.name == name).cloned()
    }

    pub fn get_by_type(&self, ty: UnitType) -> Vec<RegistryEntry> {
        self.entries.lock().iter().filter(|e| e.unit_type == ty).cloned().collect()
    }

    pub fn get_by_substring(&self, needle: &str) -> Vec<RegistryEntry> {
        self.entries.lock().iter().filter(|e| e.name.contains(needle)).cloned().collect()
    }

    /// `base@N.service` for the smallest positive `N` not yet registered.
    pub fn unique_instance_name(&self, base: &str) -> String {
        let entries = self.entries.lock();
        let mut n: u64 = 1;
        loop {
            let candidate = format!("{}@{}.service", base, n);
            if !entries.iter().any(|e| e.name.eq_ignore_ascii_case(&candidate)) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Entries polled by the monitor.
    pub fn watchlist(&self) -> Vec<RegistryEntry> {
        self.entries.lock().iter().filter(|e| e.watch).cloned().collect()
    }

    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// The unique `HOST_MGR` entry.
    pub fn host_manager(&self) -> Result<RegistryEntry, RegistryError> {
        let mut hosts = self.get_by_type(UnitType::HostMgr);
        match hosts.len() {
            0 => Err(RegistryError::NoHost),
            1 => Ok(hosts.remove(0)),
            _ => Err(RegistryError::MultipleHosts),
        }
    }

    /// Snapshot plus a receiver for every later change. Both are taken under
    /// the registry lock, so no change is missed or seen twice.
    pub fn subscribe(&self) -> (Vec<RegistryEntry>, broadcast::Receiver<RegistryEvent>) {
        let entries = self.entries.lock();
        (entries.clone(), self.events.subscribe())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
