// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the specs.

#![allow(dead_code)]

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
pub use std::time::Duration;

pub use givc_agent::test_support::{unix_agent_config, FakeBackends, FakeInit};
pub use givc_agent::{startup, AgentConfig, Backends, RunningAgent};
pub use givc_core::{TransportConfig, UnitType};
pub use givc_wire::{AdminClient, EndpointConfig, CMD_FAILURE, CMD_SUCCESS};
pub use serde_json::json;
pub use tokio_util::sync::CancellationToken;

use givc_admin::{AdminRpc, GrpcDialer, Orchestrator, OrchestratorConfig};
use tonic::service::RoutesBuilder;

/// Upper bound for anything the specs wait on.
pub const SPEC_WAIT_MAX: Duration = Duration::from_secs(5);

/// Poll `cond` every 10ms until it holds or [`SPEC_WAIT_MAX`] passes.
pub async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + SPEC_WAIT_MAX;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

pub async fn wait_for_path(path: &Path) {
    wait_for(&path.display().to_string(), || path.exists()).await;
}

/// Admin service on `<dir>/admin.sock`, dialing agents over real RPC.
pub struct Admin {
    pub orchestrator: Arc<Orchestrator>,
    pub transport: TransportConfig,
    cancel: CancellationToken,
}

impl Admin {
    pub async fn start(dir: &Path) -> Self {
        let config = OrchestratorConfig {
            locale_file: dir.join("locale.conf"),
            timezone_file: dir.join("timezone.conf"),
            ..OrchestratorConfig::default()
        };
        let orchestrator = Arc::new(Orchestrator::new(config, Arc::new(GrpcDialer::new(None))));
        let cancel = CancellationToken::new();

        let transport = TransportConfig::unix("admin-vm", dir.join("admin.sock").display().to_string());
        let listener = givc_wire::server::bind_with_retry(&transport, 1, Duration::from_millis(1)).await.unwrap();
        let mut routes = RoutesBuilder::default();
        routes.add_service(AdminRpc::new(orchestrator.clone(), cancel.clone()).into_server(false));
        tokio::spawn(givc_wire::serve(listener, routes.routes(), None, cancel.clone()));

        Self { orchestrator, transport, cancel }
    }

    pub fn client(&self) -> AdminClient {
        AdminClient::connect(&EndpointConfig::new(self.transport.clone(), None)).unwrap()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.orchestrator.registry().get_by_name(name).is_some()
    }
}

impl Drop for Admin {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A started agent plus the fakes behind it.
pub struct Agent {
    pub config: AgentConfig,
    pub fakes: FakeBackends,
    running: Option<RunningAgent>,
    cancel: CancellationToken,
}

impl Agent {
    /// Start with fake backends; registrations go to the fake registrar.
    pub async fn start(config: AgentConfig, fakes: FakeBackends) -> Self {
        let backends = fakes.backends();
        Self::start_with(config, fakes, backends).await
    }

    /// Start with fake backends but register with the real admin.
    pub async fn start_registered(config: AgentConfig, fakes: FakeBackends) -> Self {
        let admin = EndpointConfig::new(config.network.admin_endpoint.clone(), None);
        let backends = Backends { registrar: Arc::new(AdminClient::connect(&admin).unwrap()), ..fakes.backends() };
        Self::start_with(config, fakes, backends).await
    }

    async fn start_with(config: AgentConfig, fakes: FakeBackends, backends: Backends) -> Self {
        let cancel = CancellationToken::new();
        let running = startup(&config, None, backends, cancel.clone()).await.unwrap();
        Self { config, fakes, running: Some(running), cancel }
    }

    /// Cancel and wait; panics if any agent task failed.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(running) = self.running.take() {
            running.wait().await.unwrap();
        }
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
