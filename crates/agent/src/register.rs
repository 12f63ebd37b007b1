// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration of the agent and its units with the admin.
//!
//! Runs once the agent's RPC server is up, because the admin calls back into
//! the agent as soon as it accepts an entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use givc_core::{RegistryEntry, TransportConfig, UnitType};
use givc_wire::AdminClient;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{error, info, warn};

use crate::config::AgentConfig;
use crate::units::{UnitController, UnitError};

pub const REGISTER_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Admin-side registration endpoint.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, entry: RegistryEntry) -> Result<(), Status>;
}

#[async_trait]
impl Registrar for AdminClient {
    async fn register(&self, entry: RegistryEntry) -> Result<(), Status> {
        match self.register_service(entry).await? {
            None => Ok(()),
            Some(reason) => Err(Status::unknown(reason)),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("registration cancelled")]
    Cancelled,
    #[error("agent RPC server never started")]
    ServerGone,
    #[error("cannot read agent unit status: {0}")]
    AgentStatus(#[from] UnitError),
}

pub struct Registration {
    registrar: Arc<dyn Registrar>,
    controller: Arc<UnitController>,
    agent: RegistryEntry,
    units: Vec<(String, UnitType)>,
    retry_interval: Duration,
}

impl Registration {
    pub fn new(config: &AgentConfig, registrar: Arc<dyn Registrar>, controller: Arc<UnitController>) -> Self {
        let agent = RegistryEntry::new(config.service_name(), config.identity.unit_type)
            .with_parent(config.identity.parent.clone())
            .with_transport(config.agent_transport());
        Self {
            registrar,
            controller,
            agent,
            units: config.managed_units(),
            retry_interval: REGISTER_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn spawn(self, started: oneshot::Receiver<()>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self.run(started, cancel).await {
                Ok(()) => info!("registration finished"),
                Err(RegisterError::Cancelled) => info!("registration cancelled"),
                Err(e) => error!("registration failed: {}", e),
            }
        })
    }

    /// Wait for `started`, register the agent until accepted, then register
    /// each managed service once.
    pub async fn run(self, started: oneshot::Receiver<()>, cancel: CancellationToken) -> Result<(), RegisterError> {
        tokio::select! {
            _ = cancel.cancelled() => return Err(RegisterError::Cancelled),
            res = started => res.map_err(|_| RegisterError::ServerGone)?,
        }

        let status = self.controller.get_unit_status(&self.agent.name).await?;
        let agent = self.agent.clone().with_state(status);
        self.register_until_accepted(agent, &cancel).await?;

        let parent = self.agent.name.clone();
        for (name, unit_type) in self.units.iter().filter(|(name, _)| name.contains(".service")) {
            if cancel.is_cancelled() {
                return Err(RegisterError::Cancelled);
            }
            let status = match self.controller.get_unit_status(name).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(service = %name, "cannot read unit status: {}", e);
                    continue;
                }
            };
            let entry = RegistryEntry::new(name.clone(), *unit_type)
                .with_parent(parent.clone())
                .with_transport(self.transport().clone())
                .with_state(status);
            match self.registrar.register(entry).await {
                Ok(()) => info!(service = %name, "registered service"),
                Err(e) => warn!(service = %name, "error registering service: {}", e.message()),
            }
        }
        Ok(())
    }

    fn transport(&self) -> &TransportConfig {
        &self.agent.transport
    }

    async fn register_until_accepted(&self, entry: RegistryEntry, cancel: &CancellationToken) -> Result<(), RegisterError> {
        loop {
            match self.registrar.register(entry.clone()).await {
                Ok(()) => {
                    info!(agent = %entry.name, "registered agent");
                    return Ok(());
                }
                Err(e) => warn!(agent = %entry.name, "error registering agent: {}, retrying", e.message()),
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(RegisterError::Cancelled),
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
