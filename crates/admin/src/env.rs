// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the admin crate.

use std::path::PathBuf;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Directory for rolling log files. Unset or empty logs to stderr only.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("GIVC_LOG_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Split a comma or whitespace separated module list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
