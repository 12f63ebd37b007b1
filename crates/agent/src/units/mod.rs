// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whitelist-gated unit control and application launching.

pub mod controller;
pub mod launcher;
pub mod resources;
pub mod service;
pub mod whitelist;

pub use controller::UnitController;
pub use launcher::{LaunchError, Launcher, MERGE_WATCH, NO_MERGE_WATCH};
pub use service::UnitRpc;
pub use whitelist::Whitelist;

use thiserror::Error;
use tonic::{Code, Status};

use crate::init::InitError;

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit name is empty")]
    EmptyName,
    #[error("unit {0} not whitelisted")]
    NotWhitelisted(String),
    #[error("unit {0} not found")]
    NotFound(String),
    #[error("got {count} units named {name}")]
    Ambiguous { name: String, count: usize },
    #[error("job for unit {unit} failed with result '{result}'")]
    Job { unit: String, result: String },
    #[error("unit {name} is {state}")]
    NotActive { name: String, state: String },
    #[error("unit {0} has no main process")]
    NoProcess(String),
    #[error(transparent)]
    Init(#[from] InitError),
}

impl UnitError {
    pub fn code(&self) -> Code {
        match self {
            UnitError::EmptyName => Code::InvalidArgument,
            UnitError::NotWhitelisted(_) => Code::PermissionDenied,
            UnitError::NotFound(_) | UnitError::Ambiguous { .. } => Code::NotFound,
            UnitError::NotActive { .. } | UnitError::NoProcess(_) => Code::FailedPrecondition,
            UnitError::Job { .. } | UnitError::Init(_) => Code::Unknown,
        }
    }
}

impl From<UnitError> for Status {
    fn from(err: UnitError) -> Self {
        Status::new(err.code(), err.to_string())
    }
}
