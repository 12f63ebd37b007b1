// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent startup.

use std::future::Future;
use std::sync::Arc;

use givc_core::TransportConfig;
use givc_wire::tls::TlsCredentials;
use givc_wire::EndpointConfig;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tracing::{info, warn};

use super::{Backends, LifecycleError, RunningAgent};
use crate::config::{AgentConfig, EventProxyConfig, SocketProxyConfig};
use crate::event_proxy::{EventConsumer, EventProducer};
use crate::exec::ExecRpc;
use crate::hwid::HwidRpc;
use crate::locale::LocaleRpc;
use crate::notifier::NotifierRpc;
use crate::register::Registration;
use crate::socket_proxy::server::share_when_ready;
use crate::socket_proxy::{SocketProxyClient, SocketProxyServer};
use crate::units::{Launcher, UnitController, UnitRpc, Whitelist};
use crate::wifi::WifiRpc;

type Tasks = JoinSet<Result<(), LifecycleError>>;

/// Start the agent's RPC server, registration and proxies.
///
/// Returns once every listener is bound; the first registration attempt
/// happens after the agent server is up.
pub async fn startup(
    config: &AgentConfig,
    tls: Option<TlsCredentials>,
    backends: Backends,
    cancel: CancellationToken,
) -> Result<RunningAgent, LifecycleError> {
    let tls_on = tls.is_some();
    let controller = Arc::new(UnitController::new(backends.init.clone(), Whitelist::new(config.whitelist())));
    let launcher = Arc::new(Launcher::new(backends.init.clone(), config.argument_validator()));

    let mut routes = RoutesBuilder::default();
    routes.add_service(
        UnitRpc::new(controller.clone(), launcher, cancel.clone()).with_proc(backends.proc.clone()).into_server(tls_on),
    );
    routes.add_service(LocaleRpc::new(backends.commands.clone()).into_server(tls_on));
    if config.capabilities.hwid {
        let mut hwid = HwidRpc::new(&config.capabilities.hwid_interface);
        if let Some(root) = &backends.sys_net {
            hwid = hwid.with_sys_net(root);
        }
        routes.add_service(hwid.into_server(tls_on));
    }
    if let Some(wifi) = &backends.wifi {
        routes.add_service(WifiRpc::new(wifi.clone()).into_server(tls_on));
    }
    if config.capabilities.exec {
        warn!("exec enabled: the admin may run arbitrary commands on this VM");
        routes.add_service(ExecRpc::new(cancel.clone()).into_server(tls_on));
    }
    if config.capabilities.notifier {
        routes.add_service(NotifierRpc::new(&config.capabilities.notifier_socket_dir).into_server(tls_on));
    }

    let transport = config.agent_transport();
    let listener = givc_wire::bind(&transport).await?;
    let local_addr = listener.local_addr();
    info!(agent = %config.service_name(), %transport, tls = tls_on, "agent listening");

    let mut tasks = Tasks::new();
    let (started_tx, started_rx) = oneshot::channel();
    {
        let (routes, tls, cancel) = (routes.routes(), tls.clone(), cancel.clone());
        tasks.spawn(async move {
            let _ = started_tx.send(());
            givc_wire::serve(listener, routes, tls.as_ref(), cancel).await?;
            Ok(())
        });
    }

    let registration =
        Registration::new(config, backends.registrar.clone(), controller).spawn(started_rx, cancel.clone());

    for proxy in &config.capabilities.socket_proxy.sockets {
        start_socket_proxy(config, proxy, tls.as_ref(), &cancel, &mut tasks).await?;
    }
    for proxy in &config.capabilities.event_proxy.events {
        start_event_proxy(proxy, &backends, tls.as_ref(), &cancel, &mut tasks).await?;
    }

    for capability in config.unsupported_capabilities() {
        warn!(capability, "capability enabled but not supported by this agent");
    }

    Ok(RunningAgent { tasks, registration, cancel, local_addr })
}

/// Endpoint a server-mode proxy listens on: the proxy's own address if it
/// has one, else the agent's, with the proxy's port and protocol.
pub fn server_proxy_transport(config: &AgentConfig, proxy: &TransportConfig) -> TransportConfig {
    let agent = config.agent_transport();
    let address = if proxy.has_address() { proxy.address.clone() } else { agent.address };
    TransportConfig::new(agent.name, address, proxy.port.clone(), proxy.protocol)
}

/// Worker failures are logged; they never stop the agent.
fn spawn_worker<F, E>(tasks: &mut Tasks, what: &'static str, fut: F)
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display,
{
    tasks.spawn(async move {
        if let Err(e) = fut.await {
            warn!("{} stopped: {}", what, e);
        }
        Ok(())
    });
}

async fn start_socket_proxy(
    config: &AgentConfig,
    proxy: &SocketProxyConfig,
    tls: Option<&TlsCredentials>,
    cancel: &CancellationToken,
    tasks: &mut Tasks,
) -> Result<(), LifecycleError> {
    if proxy.server {
        let transport = server_proxy_transport(config, &proxy.transport);
        let listener = givc_wire::bind(&transport).await?;
        info!(socket = %proxy.socket.display(), %transport, "socket proxy server listening");
        let mut routes = RoutesBuilder::default();
        routes.add_service(SocketProxyServer::new(&proxy.socket, cancel.clone()).into_server(tls.is_some()));
        let (routes, tls, cancel_serve) = (routes.routes(), tls.cloned(), cancel.clone());
        spawn_worker(tasks, "socket proxy server", async move {
            givc_wire::serve(listener, routes, tls.as_ref(), cancel_serve).await
        });
        let (socket, cancel_share) = (proxy.socket.clone(), cancel.clone());
        tasks.spawn(async move {
            share_when_ready(socket, cancel_share).await;
            Ok(())
        });
    } else {
        let endpoint = EndpointConfig::new(proxy.transport.clone(), tls.cloned());
        let client = SocketProxyClient::new(&proxy.socket, endpoint);
        spawn_worker(tasks, "socket proxy client", client.run(cancel.clone()));
    }
    Ok(())
}

async fn start_event_proxy(
    proxy: &EventProxyConfig,
    backends: &Backends,
    tls: Option<&TlsCredentials>,
    cancel: &CancellationToken,
    tasks: &mut Tasks,
) -> Result<(), LifecycleError> {
    if proxy.producer {
        let endpoint = EndpointConfig::new(proxy.transport.clone(), tls.cloned());
        let producer = EventProducer::new(&proxy.device, endpoint, backends.devices.clone());
        spawn_worker(tasks, "event producer", producer.run(cancel.clone()));
    } else {
        let listener = givc_wire::bind(&proxy.transport).await?;
        info!(transport = %proxy.transport, "event consumer listening");
        let mut routes = RoutesBuilder::default();
        routes.add_service(EventConsumer::new(backends.virtual_devices.clone()).into_server(tls.is_some()));
        let (routes, tls, cancel) = (routes.routes(), tls.cloned(), cancel.clone());
        spawn_worker(tasks, "event consumer", async move {
            givc_wire::serve(listener, routes, tls.as_ref(), cancel).await
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
