// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered startup gate: host first, then the required system VMs.

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemState {
    Init,
    RegisterHost,
    RegisterVms,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    InitComplete,
    HostRegistered,
    VmsRegistered,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SystemState::Init => "init",
            SystemState::RegisterHost => "register-host",
            SystemState::RegisterVms => "register-vms",
            SystemState::Run => "run",
        };
        f.write_str(s)
    }
}

/// Transition table. Pairs outside the table leave the state unchanged.
pub fn next(state: SystemState, trigger: Trigger) -> SystemState {
    match (state, trigger) {
        (SystemState::Init, Trigger::InitComplete) => SystemState::RegisterHost,
        (SystemState::RegisterHost, Trigger::HostRegistered) => SystemState::RegisterVms,
        (SystemState::RegisterVms, Trigger::VmsRegistered) => SystemState::Run,
        (state, _) => state,
    }
}

/// Process-wide state machine instance.
#[derive(Debug)]
pub struct SystemFsm {
    state: Mutex<SystemState>,
}

impl Default for SystemFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemFsm {
    /// Created in `Init` and immediately advanced by `InitComplete`.
    pub fn new() -> Self {
        let fsm = Self { state: Mutex::new(SystemState::Init) };
        fsm.fire(Trigger::InitComplete);
        fsm
    }

    /// Apply `trigger`; returns the resulting state.
    pub fn fire(&self, trigger: Trigger) -> SystemState {
        let mut state = self.state.lock();
        let to = next(*state, trigger);
        if to != *state {
            info!(from = %*state, to = %to, ?trigger, "system state transition");
            *state = to;
        } else {
            debug!(state = %to, ?trigger, "ignored trigger");
        }
        to
    }

    pub fn state(&self) -> SystemState {
        *self.state.lock()
    }

    pub fn in_state(&self, state: SystemState) -> bool {
        self.state() == state
    }
}

#[cfg(test)]
#[path = "fsm_tests.rs"]
mod tests;
