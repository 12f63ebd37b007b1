// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application and VM lifecycle commands

use anyhow::{bail, Result};
use givc_wire::pb::admin::ApplicationResponse;
use givc_wire::{AdminClient, CMD_SUCCESS};

use crate::cli::{AppArgs, StartTarget};
use crate::exit_error::{ExitError, EXIT_FAILURE};
use crate::output::{print_app_response, print_started, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Stop,
    Pause,
    Resume,
}

pub async fn start(target: StartTarget, admin: &AdminClient, format: OutputFormat) -> Result<()> {
    match target {
        StartTarget::App { app, vm, args } => {
            let resp = admin.start_application(&app, vm.as_deref(), &args).await?;
            report(&resp, format)
        }
        StartTarget::Vm { vm } => print_started(&admin.start_vm(&vm).await?, format),
        StartTarget::Service { service, vm } => print_started(&admin.start_service(&service, &vm).await?, format),
    }
}

/// `givc-cli chrome --incognito` is shorthand for `givc-cli start app chrome -- --incognito`.
pub async fn start_external(words: Vec<String>, admin: &AdminClient, format: OutputFormat) -> Result<()> {
    let (app, args) = split_external(words)?;
    start(StartTarget::App { app, vm: None, args }, admin, format).await
}

pub(crate) fn split_external(mut words: Vec<String>) -> Result<(String, Vec<String>)> {
    if words.is_empty() || words[0].is_empty() {
        bail!("missing application name");
    }
    let app = words.remove(0);
    Ok((app, words))
}

pub async fn control(op: Control, args: AppArgs, admin: &AdminClient, format: OutputFormat) -> Result<()> {
    let vm = args.vm.as_deref();
    let resp = match op {
        Control::Stop => admin.stop_application(&args.app, vm).await?,
        Control::Pause => admin.pause_application(&args.app, vm).await?,
        Control::Resume => admin.resume_application(&args.app, vm).await?,
    };
    report(&resp, format)
}

/// A failed command exits non-zero with the admin's error text; JSON output
/// still prints the response.
pub(crate) fn report(resp: &ApplicationResponse, format: OutputFormat) -> Result<()> {
    if resp.cmd_status == CMD_SUCCESS {
        return print_app_response(resp, format);
    }
    if format == OutputFormat::Json {
        print_app_response(resp, format)?;
    }
    Err(ExitError::new(EXIT_FAILURE, format!("{} {}", resp.cmd_status, resp.app_status)).into())
}
