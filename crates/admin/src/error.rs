// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use givc_core::LocaleError;
use givc_wire::WireError;
use thiserror::Error;
use tonic::{Code, Status};

use crate::fsm::SystemState;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Locale(#[from] LocaleError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("cannot {op}: system is in state {state}, not all required system VMs are registered")]
    State { op: &'static str, state: SystemState },
    #[error("cannot reach agent: {0}")]
    Dial(#[from] WireError),
    /// Error reported by an agent, passed through unchanged
    #[error("{}", .0.message())]
    Agent(Status),
    #[error("{0}")]
    Failed(String),
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl From<Status> for AdminError {
    fn from(status: Status) -> Self {
        AdminError::Agent(status)
    }
}

impl AdminError {
    pub fn code(&self) -> Code {
        match self {
            AdminError::Validation(_) | AdminError::Locale(_) => Code::InvalidArgument,
            AdminError::Registry(RegistryError::MultipleHosts) => Code::FailedPrecondition,
            AdminError::Registry(_) => Code::NotFound,
            AdminError::State { .. } => Code::FailedPrecondition,
            AdminError::Dial(_) => Code::Unavailable,
            AdminError::Agent(status) => status.code(),
            AdminError::Failed(_) => Code::Unknown,
            AdminError::Unsupported(_) => Code::Unimplemented,
        }
    }
}

impl From<AdminError> for Status {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Agent(status) => status,
            other => Status::new(other.code(), other.to_string()),
        }
    }
}
