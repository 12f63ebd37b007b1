// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LocaleService`: applies locale and timezone through the host tools.
//!
//! Tool failures are logged and the RPC still succeeds; only invalid input
//! is rejected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use givc_core::{validate_timezone, LocaleAssignment, LocaleError};
use givc_wire::pb::locale::locale_service_server::{LocaleService, LocaleServiceServer};
use givc_wire::pb::locale::{Empty, LocaleMessage, TimezoneMessage};
use givc_wire::AuthInterceptor;
use thiserror::Error;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{program}: {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} exited with {status}: {stderr}")]
    Exit { program: String, status: std::process::ExitStatus, stderr: String },
}

/// Runs host commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<(), CommandError>;
}

/// Runs commands as child processes with a timeout.
#[derive(Debug, Clone)]
pub struct SystemCommands {
    timeout: Duration,
}

impl Default for SystemCommands {
    fn default() -> Self {
        Self { timeout: COMMAND_TIMEOUT }
    }
}

#[async_trait]
impl CommandRunner for SystemCommands {
    async fn run(&self, program: &str, args: &[String]) -> Result<(), CommandError> {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).kill_on_drop(true);
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CommandError::Timeout { program: program.to_string(), timeout: self.timeout })?
            .map_err(|source| CommandError::Spawn { program: program.to_string(), source })?;
        if !output.status.success() {
            return Err(CommandError::Exit {
                program: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct LocaleRpc {
    runner: Arc<dyn CommandRunner>,
    /// Set environment in the user manager instead of the system manager
    user_manager: bool,
}

impl LocaleRpc {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner, user_manager: !nix::unistd::geteuid().is_root() }
    }

    pub fn with_user_manager(mut self, user: bool) -> Self {
        self.user_manager = user;
        self
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<LocaleServiceServer<Self>, AuthInterceptor> {
        LocaleServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }

    async fn run_logged(&self, program: &str, args: Vec<String>) {
        if let Err(e) = self.runner.run(program, &args).await {
            warn!("failed to apply setting: {}", e);
        }
    }

    pub async fn apply_locale(&self, assignments: &[LocaleAssignment]) -> Result<(), LocaleError> {
        for a in assignments {
            a.validate()?;
        }
        let pairs: Vec<String> = assignments.iter().map(ToString::to_string).collect();
        info!(locale = %pairs.join(" "), "applying locale");

        let mut localectl = vec!["set-locale".to_string()];
        localectl.extend(pairs.iter().cloned());
        self.run_logged("localectl", localectl).await;

        let mut systemctl = Vec::new();
        if self.user_manager {
            systemctl.push("--user".to_string());
        }
        systemctl.push("set-environment".to_string());
        systemctl.extend(pairs);
        self.run_logged("systemctl", systemctl).await;
        Ok(())
    }

    pub async fn apply_timezone(&self, timezone: &str) -> Result<(), LocaleError> {
        validate_timezone(timezone)?;
        info!(timezone, "applying timezone");
        self.run_logged("timedatectl", vec!["set-timezone".to_string(), timezone.to_string()]).await;
        Ok(())
    }
}

#[tonic::async_trait]
impl LocaleService for LocaleRpc {
    async fn locale_set(&self, request: Request<LocaleMessage>) -> Result<Response<Empty>, Status> {
        let assignments = request
            .into_inner()
            .assignments
            .into_iter()
            .map(LocaleAssignment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        if assignments.is_empty() {
            return Err(Status::invalid_argument("no locale assignments provided"));
        }
        self.apply_locale(&assignments).await.map_err(|e| Status::invalid_argument(e.to_string()))?;
        Ok(Response::new(Empty {}))
    }

    async fn timezone_set(&self, request: Request<TimezoneMessage>) -> Result<Response<Empty>, Status> {
        let timezone = request.into_inner().timezone;
        self.apply_timezone(&timezone).await.map_err(|e| Status::invalid_argument(e.to_string()))?;
        Ok(Response::new(Empty {}))
    }
}

#[cfg(test)]
#[path = "locale_tests.rs"]
mod tests;
