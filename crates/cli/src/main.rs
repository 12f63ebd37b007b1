// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! givc-cli: command-line client for the givc admin service.

mod cli;
mod color;
mod commands;
mod exit_error;
mod output;

use anyhow::Result;
use clap::Parser;
use givc_wire::AdminClient;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::exit_error::ExitError;

/// Diagnostics go to stderr so stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.format();
    let endpoint = cli.connect.endpoint()?;
    tracing::debug!(admin = %endpoint.transport, "connecting");
    let admin = AdminClient::connect(&endpoint)?;
    commands::handle(cli.command, &admin, format).await
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        let exit = ExitError::from_anyhow(&err);
        eprintln!("Error: {}", exit);
        std::process::exit(exit.code);
    }
}
