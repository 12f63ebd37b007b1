// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! givc-agent: per-VM agent daemon.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use givc_agent::config::env::from_process_env;
use givc_agent::{env, logging, startup, AgentConfig, Backends};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "givc-agent", version, about = "Per-VM agent for the givc control plane")]
struct Args {
    /// JSON configuration file. Without it the legacy environment variables are read.
    #[arg(long, env = "GIVC_AGENT_CONFIG")]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<AgentConfig> {
    match args.config.clone().or_else(env::config_path) {
        Some(path) => AgentConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None => from_process_env().context("reading configuration from environment"),
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
    let config = load_config(&args)?;
    let log_dir = env::log_dir();
    let _log_guard = logging::init(config.runtime.debug, log_dir.as_deref(), "givc-agent.log");

    let tls = config.network.tls_config.load().context("loading TLS credentials")?;
    info!(
        agent = %config.service_name(),
        unit_type = ?config.identity.unit_type,
        parent = %config.identity.parent,
        tls = tls.is_some(),
        "starting agent"
    );

    let cancel = CancellationToken::new();
    shutdown_on_signal(cancel.clone())?;

    let backends = Backends::system(&config, tls.as_ref()).await.context("connecting to system services")?;
    let running = startup(&config, tls, backends, cancel).await.context("starting agent")?;
    running.wait().await.context("agent terminated with errors")
}
