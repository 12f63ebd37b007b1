// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application start and per-instance control.

use givc_core::{agent_service_name, AppRef, RegistryEntry, UnitStatus, UnitType};
use tonic::Status;
use tracing::{info, warn};

use super::Orchestrator;
use crate::agent::AgentApi;
use crate::error::AdminError;
use crate::fsm::SystemState;
use crate::registry::RegistryError;

/// Control operation on running application instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    Pause,
    Resume,
    Stop,
}

impl ControlOp {
    fn verb(self) -> &'static str {
        match self {
            ControlOp::Pause => "pause application",
            ControlOp::Resume => "resume application",
            ControlOp::Stop => "stop application",
        }
    }

    async fn apply(self, agent: &dyn AgentApi, unit: &str) -> Result<UnitStatus, Status> {
        match self {
            ControlOp::Pause => agent.freeze_unit(unit).await,
            ControlOp::Resume => agent.unfreeze_unit(unit).await,
            ControlOp::Stop => agent.stop_unit(unit).await,
        }
    }

    /// Whether `status` is the expected outcome of this operation.
    fn reached(self, status: &UnitStatus) -> bool {
        match self {
            ControlOp::Pause => status.is_paused(),
            ControlOp::Resume => status.is_active() && !status.is_paused(),
            ControlOp::Stop => !status.is_active(),
        }
    }
}

impl Orchestrator {
    /// Start `app` in its VM and register the resulting instance. Returns the
    /// instance name, which is an existing instance when the launch merged.
    pub async fn start_application(&self, app: &AppRef, args: &[String]) -> Result<String, AdminError> {
        if !self.fsm.in_state(SystemState::Run) {
            warn!(app = %app.name, state = %self.fsm.state(), "not all required system VMs are registered");
        }

        let vm = app.launch_vm();
        let agent_name = agent_service_name(&vm);
        info!(app = %app.name, %vm, agent = %agent_name, "starting application");

        let agent_entry = match self.registry.get_by_name(&agent_name) {
            Some(entry) => entry,
            None => {
                info!(%vm, "agent not registered, starting VM");
                self.start_vm(&vm).await?;
                self.registry
                    .get_by_name(&agent_name)
                    .ok_or_else(|| RegistryError::NotFound(agent_name.clone()))?
            }
        };
        let agent = self.agent_for(&agent_entry)?;

        let instance = self.registry.unique_instance_name(&app.name);
        let started = agent.start_application(&instance, args).await?;
        let name = if started.name.is_empty() { instance } else { started.name };

        let status = agent.get_unit_status(&name).await?;
        if !status.is_active() {
            return Err(AdminError::Failed(format!("cannot start unit {}: {}", name, status.summary())));
        }

        self.registry.register(
            RegistryEntry::new(name.clone(), UnitType::AppVmApp)
                .with_parent(agent_name)
                .with_state(status)
                .with_watch(true),
        );
        Ok(name)
    }

    /// Apply `op` to one instance (`app@N.service`) or to every application
    /// instance whose name contains the bare name. Returns the units reached.
    pub async fn control_application(&self, op: ControlOp, app: &AppRef) -> Result<Vec<String>, AdminError> {
        self.require_run(op.verb())?;

        let targets = self.control_targets(app);
        if targets.is_empty() {
            warn!(app = %app.name, "no running instances");
        }

        let mut done = Vec::with_capacity(targets.len());
        for (unit, agent_name) in targets {
            info!(%unit, agent = %agent_name, op = ?op, "dispatching");
            let agent = self.agent_by_name(&agent_name)?;
            let status = op.apply(agent.as_ref(), &unit).await?;
            if !op.reached(&status) {
                return Err(AdminError::Failed(format!("failed to {} {}: {}", op.verb(), unit, status.summary())));
            }
            let recorded = match op {
                ControlOp::Stop => self.registry.deregister(&unit).map(drop),
                _ => self.registry.update_state(&unit, status),
            };
            if let Err(e) = recorded {
                warn!(%unit, op = ?op, "registry not updated: {}", e);
            }
            done.push(unit);
        }
        Ok(done)
    }

    /// `(unit, agent)` pairs addressed by `app`.
    ///
    /// An explicit VM always selects that VM's agent. Otherwise each
    /// registered instance goes to its parent, and unknown instances to the
    /// agent named after the application.
    fn control_targets(&self, app: &AppRef) -> Vec<(String, String)> {
        let fallback = agent_service_name(&app.control_vm());
        let agent_of = |entry: Option<RegistryEntry>| match (app.explicit_vm(), entry) {
            (Some(vm), _) => agent_service_name(vm),
            (None, Some(e)) if e.has_parent() => e.parent,
            _ => fallback.clone(),
        };

        if app.is_instance() {
            let agent = agent_of(self.registry.get_by_name(&app.name));
            return vec![(app.name.clone(), agent)];
        }
        self.registry
            .get_by_substring(&app.name)
            .into_iter()
            .filter(|e| e.unit_type.is_application())
            .filter(|e| app.explicit_vm().map_or(true, |vm| e.parent == agent_service_name(vm)))
            .map(|e| (e.name.clone(), agent_of(Some(e))))
            .collect()
    }
}
