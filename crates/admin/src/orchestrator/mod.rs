// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin command routing.
//!
//! The orchestrator owns the registry, the startup state machine and the
//! remembered locale settings, and turns admin RPCs into calls on the
//! responsible agent. It is shared behind an `Arc` by the RPC service and the
//! monitor loop.

mod apps;
mod system;

pub use apps::ControlOp;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use givc_core::{agent_service_name, RegistryEntry, TransportConfig, UnitStatus, UnitType};
use tracing::{debug, info, warn};

use crate::agent::{AgentApi, AgentDialer};
use crate::error::AdminError;
use crate::fsm::{SystemFsm, SystemState, Trigger};
use crate::locale::{LocaleStore, DEFAULT_LOCALE_FILE, DEFAULT_TIMEZONE_FILE};
use crate::registry::{Registry, RegistryError};

/// Time a freshly started VM gets to boot and register its agent.
pub const VM_STARTUP_TIME: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Registry names that must be present before the system reaches `Run`
    pub required_modules: Vec<String>,
    pub vm_startup_time: Duration,
    pub locale_file: PathBuf,
    pub timezone_file: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            required_modules: Vec::new(),
            vm_startup_time: VM_STARTUP_TIME,
            locale_file: PathBuf::from(DEFAULT_LOCALE_FILE),
            timezone_file: PathBuf::from(DEFAULT_TIMEZONE_FILE),
        }
    }
}

pub struct Orchestrator {
    registry: Registry,
    fsm: SystemFsm,
    dialer: Arc<dyn AgentDialer>,
    locale: LocaleStore,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, dialer: Arc<dyn AgentDialer>) -> Self {
        let locale = LocaleStore::load(&config.locale_file, &config.timezone_file);
        Self { registry: Registry::new(), fsm: SystemFsm::new(), dialer, locale, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn fsm(&self) -> &SystemFsm {
        &self.fsm
    }

    pub fn locale(&self) -> &LocaleStore {
        &self.locale
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn require_run(&self, op: &'static str) -> Result<(), AdminError> {
        let state = self.fsm.state();
        if state == SystemState::Run {
            Ok(())
        } else {
            Err(AdminError::State { op, state })
        }
    }

    /// Transport that reaches `entry`: its own, or its parent's when it has
    /// no address of its own.
    pub fn transport_for(&self, entry: &RegistryEntry) -> Result<TransportConfig, AdminError> {
        if entry.transport.has_address() {
            return Ok(entry.transport.clone());
        }
        if !entry.has_parent() {
            return Err(AdminError::Validation(format!("{} has no address and no parent", entry.name)));
        }
        let parent = self
            .registry
            .get_by_name(&entry.parent)
            .ok_or_else(|| RegistryError::NotFound(entry.parent.clone()))?;
        if !parent.transport.has_address() {
            return Err(AdminError::Validation(format!("parent {} has no address", parent.name)));
        }
        Ok(parent.transport)
    }

    pub fn agent_for(&self, entry: &RegistryEntry) -> Result<Arc<dyn AgentApi>, AdminError> {
        let transport = self.transport_for(entry)?;
        Ok(self.dialer.dial(&transport)?)
    }

    /// Agent registered under `name`.
    fn agent_by_name(&self, name: &str) -> Result<Arc<dyn AgentApi>, AdminError> {
        let entry = self.registry.get_by_name(name).ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        self.agent_for(&entry)
    }

    fn agent_for_vm(&self, vm: &str) -> Result<Arc<dyn AgentApi>, AdminError> {
        self.agent_by_name(&agent_service_name(vm))
    }

    fn host(&self) -> Result<Arc<dyn AgentApi>, AdminError> {
        let host = self.registry.host_manager()?;
        self.agent_for(&host)
    }

    /// Ask the responsible agent for the status of `entry`.
    pub async fn remote_status(&self, entry: &RegistryEntry) -> Result<UnitStatus, AdminError> {
        let agent = self.agent_for(entry)?;
        Ok(agent.get_unit_status(&entry.name).await?)
    }

    /// Register an agent, service or application reported over RPC.
    pub async fn register_service(self: &Arc<Self>, mut entry: RegistryEntry) -> Result<(), AdminError> {
        info!(name = %entry.name, ty = %entry.unit_type, "registration attempt");
        entry.state = self.remote_status(&entry).await?;
        entry.watch = entry.unit_type.is_manager();
        let is_manager = entry.unit_type.is_manager();
        let unit_type = entry.unit_type;
        let name = entry.name.clone();
        self.registry.register(entry);

        self.advance_fsm(unit_type);
        if is_manager {
            self.push_locale_settings(&name);
        }
        Ok(())
    }

    fn advance_fsm(&self, registered: UnitType) {
        if self.fsm.in_state(SystemState::RegisterHost) && registered == UnitType::HostMgr {
            self.fsm.fire(Trigger::HostRegistered);
        }
        if self.fsm.in_state(SystemState::RegisterVms) {
            if let Some(missing) =
                self.config.required_modules.iter().find(|m| self.registry.get_by_name(m).is_none())
            {
                debug!(module = %missing, "required module not yet registered");
                return;
            }
            self.fsm.fire(Trigger::VmsRegistered);
        }
    }

    /// Send the remembered locale and timezone to a newly registered manager.
    fn push_locale_settings(&self, name: &str) {
        let settings = self.locale.current();
        if settings.assignments.is_empty() && settings.timezone.is_empty() {
            return;
        }
        let agent = match self.agent_by_name(name) {
            Ok(agent) => agent,
            Err(e) => {
                warn!(agent = name, "cannot push locale settings: {}", e);
                return;
            }
        };
        let name = name.to_string();
        tokio::spawn(async move {
            if !settings.assignments.is_empty() {
                if let Err(e) = agent.set_locale(&settings.assignments).await {
                    warn!(agent = %name, "failed to push locale: {}", e.message());
                }
            }
            if !settings.timezone.is_empty() {
                if let Err(e) = agent.set_timezone(&settings.timezone).await {
                    warn!(agent = %name, "failed to push timezone: {}", e.message());
                }
            }
        });
    }

    /// Agents of every registered manager, for fleet-wide broadcasts.
    fn manager_agents(&self) -> Vec<(String, Arc<dyn AgentApi>)> {
        self.registry
            .entries()
            .into_iter()
            .filter(|e| e.unit_type.is_manager())
            .filter_map(|e| match self.agent_for(&e) {
                Ok(agent) => Some((e.name, agent)),
                Err(err) => {
                    warn!(agent = %e.name, "skipping manager: {}", err);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
