// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::{TransportConfig, UnitStatus, UnitType};

/// One unit known to the admin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Unique key
    pub name: String,
    /// Name of the parent entry, or empty
    pub parent: String,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub transport: TransportConfig,
    pub state: UnitStatus,
    /// Polled by the monitor loop when set
    pub watch: bool,
}

impl RegistryEntry {
    pub fn new(name: impl Into<String>, unit_type: UnitType) -> Self {
        Self {
            name: name.into(),
            parent: String::new(),
            unit_type,
            transport: TransportConfig::default(),
            state: UnitStatus::default(),
            watch: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_state(mut self, state: UnitStatus) -> Self {
        self.state = state;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn has_parent(&self) -> bool {
        !self.parent.is_empty()
    }
}
