// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VM lifecycle, host power targets and fleet-wide settings.

use givc_core::{agent_service_name, vm_service_name, LocaleAssignment, UnitStatus};
use tracing::{error, info, warn};

use super::Orchestrator;
use crate::error::AdminError;

const POWEROFF_TARGET: &str = "poweroff.target";
const REBOOT_TARGET: &str = "reboot.target";
const SUSPEND_TARGET: &str = "suspend.target";

impl Orchestrator {
    /// Make sure `vm` is running on the host. Returns the VM's agent name.
    pub async fn start_vm(&self, vm: &str) -> Result<String, AdminError> {
        let host = self.host()?;
        let unit = vm_service_name(vm);

        let status = host.get_unit_status(&unit).await?;
        if !status.is_loaded() {
            return Err(AdminError::Failed(format!("vm {} not loaded", vm)));
        }
        if !status.is_active() {
            info!(%unit, "starting VM");
            host.start_unit(&unit).await?;
            tokio::time::sleep(self.config.vm_startup_time).await;
            let status = host.get_unit_status(&unit).await?;
            if !status.is_active() {
                return Err(AdminError::Failed(format!("unable to launch VM {}: {}", vm, status.summary())));
            }
        }
        Ok(agent_service_name(vm))
    }

    /// Start a loaded service in `vm` unless it already runs. Returns the VM's agent name.
    pub async fn start_service(&self, service: &str, vm: &str) -> Result<String, AdminError> {
        let agent_name = agent_service_name(vm);
        let agent = self.agent_by_name(&agent_name)?;

        let status = agent.get_unit_status(service).await?;
        if !status.is_loaded() {
            return Err(AdminError::Failed(format!("service {} is not loaded", service)));
        }
        if status.is_running() {
            info!(%service, %vm, "service already running");
        } else {
            agent.start_unit(service).await?;
        }
        Ok(agent_name)
    }

    pub async fn get_unit_status(&self, vm: &str, unit: &str) -> Result<UnitStatus, AdminError> {
        let agent = self.agent_for_vm(vm)?;
        match agent.get_unit_status(unit).await {
            Ok(status) => Ok(status),
            Err(e) => {
                error!(%vm, %unit, "error retrieving unit status: {}", e.message());
                Err(e.into())
            }
        }
    }

    async fn system_command(&self, op: &'static str, target: &str) -> Result<(), AdminError> {
        self.require_run(op)?;
        let host = self.host()?;
        info!(%target, "sending system command to host");
        host.start_unit(target).await?;
        Ok(())
    }

    pub async fn poweroff(&self) -> Result<(), AdminError> {
        self.system_command("power off", POWEROFF_TARGET).await
    }

    pub async fn reboot(&self) -> Result<(), AdminError> {
        self.system_command("reboot", REBOOT_TARGET).await
    }

    pub async fn suspend(&self) -> Result<(), AdminError> {
        self.system_command("suspend", SUSPEND_TARGET).await
    }

    pub async fn wakeup(&self) -> Result<(), AdminError> {
        Err(AdminError::Unsupported("wakeup"))
    }

    /// Validate, remember and persist `assignments`, then push them to every
    /// manager in the background.
    pub async fn set_locale(&self, assignments: Vec<LocaleAssignment>) -> Result<(), AdminError> {
        self.locale.set_locale(assignments.clone()).await?;
        let managers = self.manager_agents();
        tokio::spawn(async move {
            for (name, agent) in managers {
                if let Err(e) = agent.set_locale(&assignments).await {
                    warn!(agent = %name, "failed to set locale: {}", e.message());
                }
            }
        });
        Ok(())
    }

    pub async fn set_timezone(&self, timezone: &str) -> Result<(), AdminError> {
        self.locale.set_timezone(timezone).await?;
        let managers = self.manager_agents();
        let timezone = timezone.to_string();
        tokio::spawn(async move {
            for (name, agent) in managers {
                if let Err(e) = agent.set_timezone(&timezone).await {
                    warn!(agent = %name, "failed to set timezone: {}", e.message());
                }
            }
        });
        Ok(())
    }
}
