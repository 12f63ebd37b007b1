// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! givc-agent: per-VM unit control, application launching and the local
//! bridges (socket and input-event proxies) driven by the admin.

pub mod config;
pub mod env;
pub mod event_proxy;
pub mod exec;
pub mod hwid;
pub mod init;
pub mod lifecycle;
pub mod locale;
pub mod logging;
pub mod notifier;
pub mod register;
pub mod socket_proxy;
pub mod units;
pub mod wifi;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{AgentConfig, ConfigError};
pub use lifecycle::{startup, Backends, LifecycleError, RunningAgent};
pub use register::{Registrar, Registration};
pub use units::{Launcher, UnitController, UnitRpc};
