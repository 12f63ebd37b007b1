// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access to the local init system.
//!
//! Unit control and application launching only talk to [`InitSystem`]; the
//! production implementation drives systemd over D-Bus.

pub mod systemd;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use givc_core::UnitStatus;
use thiserror::Error;

/// Job result reported for a job that completed successfully.
pub const JOB_DONE: &str = "done";

/// Pattern matching every instantiated service unit.
pub const INSTANCE_PATTERN: &str = "*@*.service";

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Bus(#[from] zbus::Error),
    #[error("job for {0} vanished before reporting a result")]
    JobLost(String),
    #[error("{0}")]
    Failed(String),
}

/// A transient unit to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientUnit {
    pub name: String,
    pub description: String,
    pub argv: Vec<String>,
    pub environment: Vec<String>,
}

impl TransientUnit {
    /// Transient service running `argv` for application `app`.
    pub fn application(name: &str, app: &str, argv: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Application service for {}", app),
            argv,
            environment: vec!["XDG_CONFIG_DIRS=$XDG_CONFIG_DIRS:/etc/xdg".to_string()],
        }
    }
}

/// Unit operations offered by the init system.
///
/// Job-producing calls wait for the job to finish and return its result
/// string (`done`, `failed`, `canceled`, ...).
#[async_trait]
pub trait InitSystem: Send + Sync {
    /// Units with exactly these names; unknown names are simply absent.
    async fn list_units_by_names(&self, names: &[String]) -> Result<Vec<UnitStatus>, InitError>;

    /// Active units whose names match `pattern`.
    async fn list_active_units(&self, pattern: &str) -> Result<Vec<UnitStatus>, InitError>;

    async fn restart_unit(&self, name: &str) -> Result<String, InitError>;

    async fn stop_unit(&self, name: &str) -> Result<String, InitError>;

    async fn kill_unit(&self, name: &str, signal: i32) -> Result<(), InitError>;

    async fn freeze_unit(&self, name: &str) -> Result<(), InitError>;

    async fn thaw_unit(&self, name: &str) -> Result<(), InitError>;

    async fn freezer_state(&self, name: &str) -> Result<String, InitError>;

    /// Command lines of the unit's `ExecStart`, each flattened to one string.
    async fn exec_start(&self, name: &str) -> Result<Vec<String>, InitError>;

    /// Main process id; 0 when the unit has none.
    async fn main_pid(&self, name: &str) -> Result<u32, InitError>;

    async fn start_transient_unit(&self, unit: &TransientUnit) -> Result<String, InitError>;
}
