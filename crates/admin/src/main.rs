// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! givc-admin: fleet control plane daemon.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use givc_admin::locale::{DEFAULT_LOCALE_FILE, DEFAULT_TIMEZONE_FILE};
use givc_admin::{env, logging, AdminRpc, GrpcDialer, Monitor, Orchestrator, OrchestratorConfig};
use givc_core::TransportConfig;
use givc_wire::TlsConfig;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "givc-admin", version, about = "Fleet admin service for givc agents")]
struct Args {
    /// Listen address: `host:port`, `unix:/path` or `vsock:cid:port`. Repeatable.
    #[arg(long = "listen", env = "LISTEN_ADDRS", value_delimiter = ',', required = true)]
    listen: Vec<String>,

    /// Name presented to peers; also the TLS server name.
    #[arg(long, env = "NAME", default_value = "admin-vm")]
    name: String,

    #[arg(long, env = "TLS")]
    tls: bool,

    #[arg(long, env = "CA_CERT", requires = "tls")]
    ca_cert: Option<PathBuf>,

    #[arg(long, env = "HOST_CERT", requires = "tls")]
    host_cert: Option<PathBuf>,

    #[arg(long, env = "HOST_KEY", requires = "tls")]
    host_key: Option<PathBuf>,

    /// Poll watched units and recover failed VMs.
    #[arg(long, env = "MONITORING", default_value_t = true, action = clap::ArgAction::Set)]
    monitoring: bool,

    /// Units that must register before the system reaches `run`.
    #[arg(long, env = "SERVICES", default_value = "")]
    required: String,

    #[arg(long, default_value = DEFAULT_LOCALE_FILE)]
    locale_file: PathBuf,

    #[arg(long, default_value = DEFAULT_TIMEZONE_FILE)]
    timezone_file: PathBuf,
}

impl Args {
    fn tls_config(&self) -> Result<TlsConfig> {
        if !self.tls {
            return Ok(TlsConfig::default());
        }
        match (&self.ca_cert, &self.host_cert, &self.host_key) {
            (Some(ca), Some(cert), Some(key)) => Ok(TlsConfig::new(ca, cert, key)),
            _ => bail!("--tls requires --ca-cert, --host-cert and --host-key"),
        }
    }
}

fn shutdown_on_signal(cancel: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
        cancel.cancel();
    });
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_dir = env::log_dir();
    let _log_guard = logging::init(env::DEFAULT_LOG_FILTER, log_dir.as_deref(), "givc-admin.log");

    let tls = args.tls_config()?.load().context("loading TLS credentials")?;
    let listeners = args
        .listen
        .iter()
        .map(|spec| TransportConfig::parse_listen(&args.name, spec))
        .collect::<Result<Vec<_>, _>>()
        .context("parsing listen addresses")?;

    let config = OrchestratorConfig {
        required_modules: env::split_list(&args.required),
        locale_file: args.locale_file.clone(),
        timezone_file: args.timezone_file.clone(),
        ..OrchestratorConfig::default()
    };
    info!(name = %args.name, required = ?config.required_modules, tls = tls.is_some(), "starting admin");

    let orchestrator = Arc::new(Orchestrator::new(config, Arc::new(GrpcDialer::new(tls.clone()))));
    let cancel = CancellationToken::new();
    shutdown_on_signal(cancel.clone())?;

    let routes = Routes::new(AdminRpc::new(orchestrator.clone(), cancel.clone()).into_server(tls.is_some()));
    let mut tasks = JoinSet::new();
    for transport in &listeners {
        let listener = givc_wire::bind(transport).await.with_context(|| format!("binding {}", transport))?;
        let (routes, tls, cancel) = (routes.clone(), tls.clone(), cancel.clone());
        tasks.spawn(async move { givc_wire::serve(listener, routes, tls.as_ref(), cancel).await });
    }

    if args.monitoring {
        tokio::spawn(Monitor::new(orchestrator).run(cancel.clone()));
    }

    let mut failed = false;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("server failed: {}", e);
                failed = true;
                cancel.cancel();
            }
            Err(e) => {
                error!("server task aborted: {}", e);
                failed = true;
                cancel.cancel();
            }
        }
    }
    if failed {
        bail!("admin server terminated with errors");
    }
    info!("admin stopped");
    Ok(())
}
