// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process environment read by the agent binary. The legacy configuration
//! variables live in [`crate::config::env`].

use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Filter used when the configuration asks for debug output.
pub const DEBUG_LOG_FILTER: &str = "debug";

/// Path of the JSON configuration, if given through the environment.
pub fn config_path() -> Option<PathBuf> {
    non_empty("GIVC_AGENT_CONFIG").map(PathBuf::from)
}

/// Directory for rolling log files. Unset or empty logs to stderr only.
pub fn log_dir() -> Option<PathBuf> {
    non_empty("GIVC_LOG_DIR").map(PathBuf::from)
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
