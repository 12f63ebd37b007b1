// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observable state of an init-system unit.

use serde::{Deserialize, Serialize};

/// Unit state as reported by the init system.
///
/// Carried unchanged across the RPC boundary and stored in registry entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatus {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    pub path: String,
    pub freezer_state: String,
}

impl UnitStatus {
    /// Synthetic status for an application unit that already ran to completion.
    pub fn exited(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Exited application: {}", name),
            load_state: String::new(),
            active_state: "inactive".to_string(),
            sub_state: "dead".to_string(),
            path: String::new(),
            freezer_state: String::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_state == "active"
    }

    pub fn is_inactive(&self) -> bool {
        self.active_state == "inactive"
    }

    pub fn is_failed(&self) -> bool {
        self.active_state == "failed"
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state == "loaded"
    }

    pub fn is_running(&self) -> bool {
        self.is_active() && self.sub_state == "running"
    }

    pub fn is_paused(&self) -> bool {
        self.freezer_state == "frozen"
    }

    pub fn is_exited(&self) -> bool {
        (self.is_inactive() && self.sub_state == "dead") || self.is_failed()
    }

    /// Short human-readable state, e.g. `active (running)`.
    pub fn summary(&self) -> String {
        if self.is_paused() {
            return "paused".to_string();
        }
        if self.sub_state.is_empty() {
            return self.active_state.clone();
        }
        format!("{} ({})", self.active_state, self.sub_state)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
