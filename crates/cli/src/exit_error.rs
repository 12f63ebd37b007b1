// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` (or a raw `tonic::Status`) instead of calling
//! `std::process::exit()` directly, allowing `main()` to pick the code.

use std::fmt;

use tonic::{Code, Status};

/// Any failure without a more specific code.
pub const EXIT_FAILURE: i32 = 1;
/// The admin service could not be reached.
pub const EXIT_UNREACHABLE: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Exit code and message for whatever error a command returned.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(exit) = err.downcast_ref::<ExitError>() {
            return exit.clone();
        }
        if let Some(status) = err.downcast_ref::<Status>() {
            return Self::from(status);
        }
        Self::new(EXIT_FAILURE, format!("{:#}", err))
    }
}

impl From<&Status> for ExitError {
    fn from(status: &Status) -> Self {
        let code = match status.code() {
            Code::Unavailable | Code::DeadlineExceeded => EXIT_UNREACHABLE,
            _ => EXIT_FAILURE,
        };
        let message = if status.message().is_empty() {
            status.code().description().to_string()
        } else {
            format!("{}: {}", status.code().description(), status.message())
        };
        Self::new(code, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
