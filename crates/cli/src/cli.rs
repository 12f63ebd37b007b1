// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use givc_core::{LocaleAssignment, Protocol, TransportConfig};
use givc_wire::tls::TlsCredentials;
use givc_wire::{EndpointConfig, TlsConfig};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "givc-cli",
    version,
    about = "Control applications, VMs and power state through the givc admin service",
    styles = crate::color::styles(),
)]
pub struct Cli {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Print results as JSON, one document per line
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn format(&self) -> OutputFormat {
        OutputFormat::from_json_flag(self.json)
    }
}

/// Where the admin service lives and how to authenticate to it.
#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Admin service name; also the expected TLS server name
    #[arg(long, env = "NAME", default_value = "admin-vm")]
    pub name: String,

    /// Address, or socket path for `--protocol unix`
    #[arg(long, visible_alias = "ip", env = "ADDR", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "9000")]
    pub port: String,

    /// tcp, unix or vsock
    #[arg(long, default_value = "tcp")]
    pub protocol: Protocol,

    #[arg(long, env = "CA_CERT")]
    pub ca: Option<PathBuf>,

    #[arg(long, env = "HOST_CERT")]
    pub cert: Option<PathBuf>,

    #[arg(long, env = "HOST_KEY")]
    pub key: Option<PathBuf>,

    /// Connect without TLS
    #[arg(long)]
    pub notls: bool,
}

impl ConnectArgs {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::new(&self.name, &self.host, &self.port, self.protocol)
    }

    pub fn tls(&self) -> Result<Option<TlsCredentials>> {
        if self.notls {
            return Ok(None);
        }
        match (&self.ca, &self.cert, &self.key) {
            (Some(ca), Some(cert), Some(key)) => {
                TlsConfig::new(ca, cert, key).load().context("loading TLS credentials")
            }
            _ => bail!("--ca, --cert and --key are required unless --notls is given"),
        }
    }

    pub fn endpoint(&self) -> Result<EndpointConfig> {
        Ok(EndpointConfig::new(self.transport(), self.tls()?))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an application, a VM or a service
    Start {
        #[command(subcommand)]
        target: StartTarget,
    },
    /// Stop a running application
    Stop(AppArgs),
    /// Freeze a running application
    Pause(AppArgs),
    /// Thaw a paused application
    Resume(AppArgs),
    /// Power the system off
    Poweroff,
    /// Reboot the system
    Reboot,
    /// Suspend the system
    Suspend,
    /// Wake the system from suspend
    Wakeup,
    /// List registered units
    QueryList,
    /// Show the status of a unit on a VM
    Status { vm: String, unit: String },
    /// Set system locale, e.g. `LANG=en_US.UTF-8 LC_TIME=fi_FI.UTF-8`
    SetLocale {
        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<LocaleAssignment>,
    },
    /// Set system timezone, e.g. `Europe/Helsinki`
    SetTimezone { timezone: String },
    /// Stream registry changes
    Watch {
        /// Print the registry snapshot before the first change
        #[arg(long)]
        initial: bool,
        /// Exit after this many changes
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Checks for scripts and test harnesses
    Test {
        #[command(subcommand)]
        check: TestCommand,
    },
    /// Any other name starts the application of that name
    #[command(external_subcommand)]
    App(Vec<String>),
}

#[derive(Debug, Subcommand)]
pub enum StartTarget {
    /// Start an application instance
    App {
        app: String,
        /// VM to start it in; defaults to wherever the application is registered
        #[arg(long)]
        vm: Option<String>,
        /// Arguments passed to the application
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Start a VM
    Vm { vm: String },
    /// Start a service inside a VM
    Service {
        service: String,
        #[arg(long)]
        vm: String,
    },
}

#[derive(Debug, Args)]
pub struct AppArgs {
    /// Application instance, e.g. `chrome@1.service`
    pub app: String,
    #[arg(long)]
    pub vm: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TestCommand {
    /// Succeed once `service` shows up in the registry
    Ensure {
        service: String,
        /// Attempts, one second apart
        #[arg(long, default_value_t = 1)]
        retry: u32,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
