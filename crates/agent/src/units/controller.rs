// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whitelist-gated unit operations.

use std::sync::Arc;

use givc_core::UnitStatus;
use nix::sys::signal::Signal;
use tracing::{debug, info, warn};

use super::{UnitError, Whitelist};
use crate::init::{InitSystem, JOB_DONE};

/// Freezer state reported when the property cannot be read.
pub const FREEZER_UNKNOWN: &str = "error";

pub struct UnitController {
    init: Arc<dyn InitSystem>,
    whitelist: Whitelist,
}

impl UnitController {
    pub fn new(init: Arc<dyn InitSystem>, whitelist: Whitelist) -> Self {
        Self { init, whitelist }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    fn check(&self, name: &str) -> Result<(), UnitError> {
        if name.is_empty() {
            return Err(UnitError::EmptyName);
        }
        if !self.whitelist.allows(name) {
            warn!(unit = name, "rejecting request for unit outside the whitelist");
            return Err(UnitError::NotWhitelisted(name.to_string()));
        }
        Ok(())
    }

    /// Units named `name`; at least one.
    pub async fn find_unit(&self, name: &str) -> Result<Vec<UnitStatus>, UnitError> {
        self.check(name)?;
        let units = self.init.list_units_by_names(&[name.to_string()]).await?;
        if units.is_empty() {
            return Err(UnitError::NotFound(name.to_string()));
        }
        Ok(units)
    }

    pub async fn start_unit(&self, name: &str) -> Result<(), UnitError> {
        for unit in self.find_unit(name).await? {
            info!(unit = %unit.name, "restarting unit");
            let result = self.init.restart_unit(&unit.name).await?;
            expect_done(&unit.name, result)?;
        }
        Ok(())
    }

    pub async fn stop_unit(&self, name: &str) -> Result<(), UnitError> {
        for unit in self.find_unit(name).await? {
            info!(unit = %unit.name, "stopping unit");
            let result = self.init.stop_unit(&unit.name).await?;
            expect_done(&unit.name, result)?;
        }
        Ok(())
    }

    /// Send SIGKILL to every process of the unit without waiting.
    pub async fn kill_unit(&self, name: &str) -> Result<(), UnitError> {
        for unit in self.find_unit(name).await? {
            info!(unit = %unit.name, "killing unit");
            self.init.kill_unit(&unit.name, Signal::SIGKILL as i32).await?;
        }
        Ok(())
    }

    pub async fn freeze_unit(&self, name: &str) -> Result<(), UnitError> {
        for unit in self.find_unit(name).await? {
            info!(unit = %unit.name, "freezing unit");
            self.init.freeze_unit(&unit.name).await?;
        }
        Ok(())
    }

    pub async fn unfreeze_unit(&self, name: &str) -> Result<(), UnitError> {
        for unit in self.find_unit(name).await? {
            info!(unit = %unit.name, "thawing unit");
            self.init.thaw_unit(&unit.name).await?;
        }
        Ok(())
    }

    /// Status of the one unit named `name`, including its freezer state.
    pub async fn get_unit_status(&self, name: &str) -> Result<UnitStatus, UnitError> {
        let units = self.find_unit(name).await?;
        let [unit] = <[UnitStatus; 1]>::try_from(units)
            .map_err(|units| UnitError::Ambiguous { name: name.to_string(), count: units.len() })?;
        Ok(with_freezer_state(self.init.as_ref(), unit).await)
    }

    /// Main process of an active unit.
    pub async fn main_pid(&self, name: &str) -> Result<u32, UnitError> {
        let status = self.get_unit_status(name).await?;
        if !status.is_active() {
            return Err(UnitError::NotActive { name: status.name, state: status.active_state });
        }
        match self.init.main_pid(&status.name).await? {
            0 => Err(UnitError::NoProcess(status.name)),
            pid => Ok(pid),
        }
    }
}

fn expect_done(unit: &str, result: String) -> Result<(), UnitError> {
    if result == JOB_DONE {
        debug!(unit, "job done");
        Ok(())
    } else {
        Err(UnitError::Job { unit: unit.to_string(), result })
    }
}

/// Fill in `FreezerState`, falling back to [`FREEZER_UNKNOWN`].
pub(crate) async fn with_freezer_state(init: &dyn InitSystem, mut unit: UnitStatus) -> UnitStatus {
    unit.freezer_state = match init.freezer_state(&unit.name).await {
        Ok(state) => state,
        Err(e) => {
            debug!(unit = %unit.name, "freezer state unavailable: {}", e);
            FREEZER_UNKNOWN.to_string()
        }
    };
    unit
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
