// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod app;
pub mod query;
pub mod system;

use anyhow::Result;
use givc_wire::AdminClient;

use crate::cli::Command;
use crate::output::OutputFormat;

pub async fn handle(command: Command, admin: &AdminClient, format: OutputFormat) -> Result<()> {
    match command {
        Command::Start { target } => app::start(target, admin, format).await,
        Command::Stop(args) => app::control(app::Control::Stop, args, admin, format).await,
        Command::Pause(args) => app::control(app::Control::Pause, args, admin, format).await,
        Command::Resume(args) => app::control(app::Control::Resume, args, admin, format).await,
        Command::App(words) => app::start_external(words, admin, format).await,
        Command::Poweroff => system::power(system::Power::Off, admin).await,
        Command::Reboot => system::power(system::Power::Reboot, admin).await,
        Command::Suspend => system::power(system::Power::Suspend, admin).await,
        Command::Wakeup => system::power(system::Power::Wakeup, admin).await,
        Command::SetLocale { assignments } => system::set_locale(&assignments, admin).await,
        Command::SetTimezone { timezone } => system::set_timezone(&timezone, admin).await,
        Command::QueryList => query::list(admin, format).await,
        Command::Status { vm, unit } => query::status(&vm, &unit, admin, format).await,
        Command::Watch { initial, limit } => query::watch(admin, initial, limit, format).await,
        Command::Test { check } => test::handle(check, admin).await,
    }
}
