// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle: backends, startup, and the wait for shutdown.

mod startup;
pub use startup::{server_proxy_transport, startup};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use givc_wire::tls::TlsCredentials;
use givc_wire::{AdminClient, EndpointConfig, ServeError, TlsError, WireError};
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AgentConfig;
use crate::event_proxy::{DeviceFinder, EvdevFinder, EventProxyError, UinputFactory, VirtualDeviceFactory};
use crate::init::systemd::SystemdInit;
use crate::init::{InitError, InitSystem};
use crate::locale::{CommandRunner, SystemCommands};
use crate::register::Registrar;
use crate::socket_proxy::ProxyError;
use crate::units::resources::ProcFs;
use crate::wifi::network_manager::NetworkManagerWifi;
use crate::wifi::WifiBackend;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("TLS: {0}")]
    Tls(#[from] TlsError),
    #[error("init system: {0}")]
    Init(#[from] InitError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Serve(#[from] ServeError),
    #[error("socket proxy: {0}")]
    Proxy(#[from] ProxyError),
    #[error("event proxy: {0}")]
    EventProxy(#[from] EventProxyError),
    #[error("task aborted: {0}")]
    Task(String),
}

/// Everything the agent talks to outside its own process.
pub struct Backends {
    pub init: Arc<dyn InitSystem>,
    pub registrar: Arc<dyn Registrar>,
    pub commands: Arc<dyn CommandRunner>,
    /// `None` leaves the wifi service unregistered
    pub wifi: Option<Arc<dyn WifiBackend>>,
    pub devices: Arc<dyn DeviceFinder>,
    pub virtual_devices: Arc<dyn VirtualDeviceFactory>,
    pub proc: ProcFs,
    /// Override for `/sys/class/net`
    pub sys_net: Option<PathBuf>,
}

impl Backends {
    /// systemd over D-Bus, the admin over RPC, host commands, evdev/uinput,
    /// and NetworkManager when wifi is enabled.
    pub async fn system(config: &AgentConfig, tls: Option<&TlsCredentials>) -> Result<Self, LifecycleError> {
        let init = SystemdInit::connect().await?;
        let admin = AdminClient::connect(&EndpointConfig::new(config.network.admin_endpoint.clone(), tls.cloned()))?;
        let wifi: Option<Arc<dyn WifiBackend>> = if config.capabilities.wifi {
            match NetworkManagerWifi::connect().await {
                Ok(nm) => Some(Arc::new(nm)),
                Err(e) => {
                    warn!("wifi enabled but NetworkManager is unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Ok(Self {
            init: Arc::new(init),
            registrar: Arc::new(admin),
            commands: Arc::new(SystemCommands::default()),
            wifi,
            devices: Arc::new(EvdevFinder::default()),
            virtual_devices: Arc::new(UinputFactory),
            proc: ProcFs::default(),
            sys_net: None,
        })
    }
}

/// A started agent.
pub struct RunningAgent {
    tasks: JoinSet<Result<(), LifecycleError>>,
    registration: JoinHandle<()>,
    cancel: CancellationToken,
    local_addr: Option<SocketAddr>,
}

impl RunningAgent {
    /// Bound TCP address of the agent's RPC server.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Wait for every task to finish. The first failure cancels the rest and
    /// is returned.
    pub async fn wait(mut self) -> Result<(), LifecycleError> {
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            let result = joined.map_err(|e| LifecycleError::Task(e.to_string())).and_then(|r| r);
            if let Err(e) = result {
                error!("agent task failed: {}", e);
                self.cancel.cancel();
                first_error.get_or_insert(e);
            }
        }
        self.cancel.cancel();
        if let Err(e) = self.registration.await {
            warn!("registration task aborted: {}", e);
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!("agent stopped");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
