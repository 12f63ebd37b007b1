// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient application launches.
//!
//! Some applications hand a new request to an instance that is already
//! running and exit straight away. The launcher looks for such an instance
//! before starting, and when the new unit goes inactive during the watch
//! window it reports the running instance instead, so the admin registers a
//! unit that actually exists.

use std::sync::Arc;
use std::time::Duration;

use givc_core::{ArgumentValidator, UnitStatus, ValidationError};
use thiserror::Error;
use tokio::time::Instant;
use tonic::{Code, Status};
use tracing::{debug, info, warn};

use super::UnitError;
use crate::init::{InitError, InitSystem, TransientUnit, INSTANCE_PATTERN, JOB_DONE};

/// Watch window when no running instance could absorb the launch.
pub const NO_MERGE_WATCH: Duration = Duration::from_secs(0);

/// Watch window when a running instance may absorb the launch.
pub const MERGE_WATCH: Duration = Duration::from_secs(2);

pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Programs that run the real command given as their first argument.
pub const WRAPPER_PROGRAMS: &[&str] = &["waypipe"];

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error("failed to start app {unit}: {result}")]
    Job { unit: String, result: String },
    #[error("application {0} failed after start")]
    Failed(String),
}

impl From<InitError> for LaunchError {
    fn from(err: InitError) -> Self {
        LaunchError::Unit(err.into())
    }
}

impl From<LaunchError> for Status {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Validation(e) => Status::invalid_argument(e.to_string()),
            LaunchError::Unit(e) => e.into(),
            e @ LaunchError::Job { .. } => Status::new(Code::Unknown, e.to_string()),
            e @ LaunchError::Failed(_) => Status::new(Code::Unknown, e.to_string()),
        }
    }
}

pub struct Launcher {
    init: Arc<dyn InitSystem>,
    validator: ArgumentValidator,
}

impl Launcher {
    pub fn new(init: Arc<dyn InitSystem>, validator: ArgumentValidator) -> Self {
        Self { init, validator }
    }

    pub fn validator(&self) -> &ArgumentValidator {
        &self.validator
    }

    /// Start `service` (`<app>@<id>.service`) with runtime `args` and report
    /// the unit that ends up serving the request.
    pub async fn start_application(&self, service: &str, args: &[String]) -> Result<UnitStatus, LaunchError> {
        let manifest = self.validator.validate_app_unit_request(service, args)?;
        let mut argv = manifest.argv();
        argv.extend(args.iter().cloned());

        let candidate = self.merge_candidate(&argv).await?;
        if let Some(unit) = &candidate {
            debug!(service, candidate = %unit.name, "launch may merge into running instance");
        }

        let unit = TransientUnit::application(service, &manifest.name, argv);
        let result = self.init.start_transient_unit(&unit).await?;
        if result != JOB_DONE {
            return Err(LaunchError::Job { unit: service.to_string(), result });
        }
        info!(service, "application started");

        let window = if candidate.is_some() { MERGE_WATCH } else { NO_MERGE_WATCH };
        self.watch(service, candidate, window).await
    }

    /// First active instance whose `ExecStart` runs the same command.
    async fn merge_candidate(&self, argv: &[String]) -> Result<Option<UnitStatus>, InitError> {
        let Some(token) = command_token(argv) else {
            return Ok(None);
        };
        for unit in self.init.list_active_units(INSTANCE_PATTERN).await? {
            let mut matches = self.init.list_units_by_names(std::slice::from_ref(&unit.name)).await?;
            if matches.len() != 1 {
                continue;
            }
            let exec_start = match self.init.exec_start(&unit.name).await {
                Ok(lines) => lines,
                Err(e) => {
                    debug!(unit = %unit.name, "cannot read ExecStart: {}", e);
                    continue;
                }
            };
            if exec_start.iter().any(|line| line.contains(token)) {
                return Ok(matches.pop());
            }
        }
        Ok(None)
    }

    async fn watch(
        &self,
        service: &str,
        candidate: Option<UnitStatus>,
        window: Duration,
    ) -> Result<UnitStatus, LaunchError> {
        let deadline = Instant::now() + window;
        loop {
            let status = self.status(service).await?;
            if status.is_failed() {
                warn!(service, "application failed during startup");
                return Err(LaunchError::Failed(service.to_string()));
            }
            if status.is_inactive() {
                return match &candidate {
                    None => {
                        info!(service, "application ran to completion");
                        Ok(UnitStatus::exited(service))
                    }
                    Some(merged) => {
                        info!(service, merged_into = %merged.name, "application merged into running instance");
                        Ok(self.status(&merged.name).await?)
                    }
                };
            }
            if Instant::now() >= deadline {
                return Ok(status);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn status(&self, name: &str) -> Result<UnitStatus, UnitError> {
        let units = self.init.list_units_by_names(&[name.to_string()]).await?;
        let [unit] = <[UnitStatus; 1]>::try_from(units).map_err(|units| match units.len() {
            0 => UnitError::NotFound(name.to_string()),
            count => UnitError::Ambiguous { name: name.to_string(), count },
        })?;
        Ok(super::controller::with_freezer_state(self.init.as_ref(), unit).await)
    }
}

/// The command token identifying a launch: argv0, or argv1 behind a wrapper
/// that has an argument.
pub fn command_token(argv: &[String]) -> Option<&str> {
    let first = argv.first()?;
    let wrapped = WRAPPER_PROGRAMS.iter().any(|w| first.contains(w));
    let token = if wrapped { argv.get(1).unwrap_or(first) } else { first };
    Some(token.as_str())
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
