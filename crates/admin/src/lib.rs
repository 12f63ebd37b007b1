// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! givc-admin: fleet registry, startup gate and command routing for the
//! per-VM agents.

pub mod agent;
pub mod env;
pub mod error;
pub mod fsm;
pub mod locale;
pub mod logging;
pub mod monitor;
pub mod orchestrator;
pub mod query;
pub mod registry;
pub mod service;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{AgentApi, AgentDialer, GrpcDialer};
pub use error::AdminError;
pub use fsm::{SystemFsm, SystemState, Trigger};
pub use locale::{LocaleSettings, LocaleStore};
pub use monitor::{Monitor, Sweep, WATCH_INTERVAL};
pub use orchestrator::{ControlOp, Orchestrator, OrchestratorConfig, VM_STARTUP_TIME};
pub use registry::{Registry, RegistryError, RegistryEvent};
pub use service::AdminRpc;
