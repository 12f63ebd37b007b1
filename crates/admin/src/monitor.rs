// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic liveness polling of watched registry entries.

use std::sync::Arc;
use std::time::Duration;

use givc_core::{vm_from_agent_service, RegistryEntry, UnitType};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::AdminError;
use crate::orchestrator::Orchestrator;

pub const WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Result of one pass over the watchlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sweep {
    /// Every watched entry answered `active`
    Healthy { checked: usize },
    /// `name` failed and its handler ran; later entries were not polled
    Aborted { name: String },
}

pub struct Monitor {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
}

impl Monitor {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator, interval: WATCH_INTERVAL }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sweep every interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        tick.tick().await;
        info!(interval = ?self.interval, "monitor started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {}
            }
            let outcome = self.sweep().await;
            debug!(?outcome, "sweep finished");
        }
        info!("monitor stopped");
    }

    /// Poll the watchlist snapshot in order. The first failing entry has its
    /// handler run and ends the sweep.
    pub async fn sweep(&self) -> Sweep {
        let watchlist = self.orchestrator.registry().watchlist();
        let checked = watchlist.len();
        for entry in watchlist {
            debug!(name = %entry.name, "polling");
            match self.orchestrator.remote_status(&entry).await {
                Ok(status) if status.is_active() => {
                    if let Err(e) = self.orchestrator.registry().update_state(&entry.name, status) {
                        debug!(name = %entry.name, "entry vanished during sweep: {}", e);
                    }
                }
                Ok(status) => {
                    warn!(name = %entry.name, state = %status.summary(), "unit is not active");
                    if let Err(e) = self.orchestrator.registry().update_state(&entry.name, status) {
                        debug!(name = %entry.name, "entry vanished during sweep: {}", e);
                    }
                    return self.abort(entry).await;
                }
                Err(e) => {
                    warn!(name = %entry.name, "could not get unit status: {}", e);
                    return self.abort(entry).await;
                }
            }
        }
        Sweep::Healthy { checked }
    }

    async fn abort(&self, entry: RegistryEntry) -> Sweep {
        let name = entry.name.clone();
        if let Err(e) = self.handle_error(entry).await {
            error!(%name, "error handler failed: {}", e);
        }
        Sweep::Aborted { name }
    }

    async fn handle_error(&self, entry: RegistryEntry) -> Result<(), AdminError> {
        info!(name = %entry.name, ty = %entry.unit_type, "handling unit failure");
        match entry.unit_type {
            UnitType::AppVmApp => {
                self.orchestrator.registry().deregister(&entry.name)?;
            }
            UnitType::AppVmMgr | UnitType::SysVmMgr => {
                let vm = vm_from_agent_service(&entry.name).ok_or_else(|| {
                    AdminError::Validation(format!("cannot derive VM from {}", entry.name))
                })?;
                info!(%vm, "restarting VM");
                self.orchestrator.start_vm(vm).await?;
            }
            other => {
                error!(name = %entry.name, ty = %other, "no recovery for this unit type");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
