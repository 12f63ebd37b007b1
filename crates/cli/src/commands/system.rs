// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power and locale commands

use anyhow::Result;
use givc_core::{validate_timezone, LocaleAssignment};
use givc_wire::AdminClient;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    Off,
    Reboot,
    Suspend,
    Wakeup,
}

pub async fn power(action: Power, admin: &AdminClient) -> Result<()> {
    info!(?action, "requesting power transition");
    match action {
        Power::Off => admin.poweroff().await?,
        Power::Reboot => admin.reboot().await?,
        Power::Suspend => admin.suspend().await?,
        Power::Wakeup => admin.wakeup().await?,
    }
    Ok(())
}

pub async fn set_locale(assignments: &[LocaleAssignment], admin: &AdminClient) -> Result<()> {
    admin.set_locale(assignments).await?;
    Ok(())
}

/// Rejected locally before anything is sent.
pub async fn set_timezone(timezone: &str, admin: &AdminClient) -> Result<()> {
    validate_timezone(timezone)?;
    admin.set_timezone(timezone).await?;
    Ok(())
}
