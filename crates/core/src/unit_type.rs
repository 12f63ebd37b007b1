// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit type tags and their VM/unit class decomposition.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of machine a unit lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmClass {
    Host,
    AdmVm,
    SysVm,
    AppVm,
}

/// What a unit is within its machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitClass {
    /// The VM itself (host has none)
    Vm,
    /// The agent service running inside the machine
    Manager,
    Service,
    Application,
}

/// Closed set of registry unit types.
///
/// The numeric value is the wire representation and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum UnitType {
    HostMgr = 0,
    HostSvc = 1,
    HostApp = 2,
    AdmVm = 3,
    AdmVmMgr = 4,
    AdmVmSvc = 5,
    AdmVmApp = 6,
    SysVm = 7,
    SysVmMgr = 8,
    SysVmSvc = 9,
    SysVmApp = 10,
    AppVm = 11,
    AppVmMgr = 12,
    AppVmSvc = 13,
    AppVmApp = 14,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitTypeError {
    #[error("unknown unit type: {0}")]
    Unknown(u32),
    #[error("unknown unit type name: {0}")]
    UnknownName(String),
}

impl UnitType {
    pub const ALL: [UnitType; 15] = [
        UnitType::HostMgr,
        UnitType::HostSvc,
        UnitType::HostApp,
        UnitType::AdmVm,
        UnitType::AdmVmMgr,
        UnitType::AdmVmSvc,
        UnitType::AdmVmApp,
        UnitType::SysVm,
        UnitType::SysVmMgr,
        UnitType::SysVmSvc,
        UnitType::SysVmApp,
        UnitType::AppVm,
        UnitType::AppVmMgr,
        UnitType::AppVmSvc,
        UnitType::AppVmApp,
    ];

    pub fn from_u32(value: u32) -> Result<Self, UnitTypeError> {
        Self::ALL.get(value as usize).copied().ok_or(UnitTypeError::Unknown(value))
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn vm_class(self) -> VmClass {
        match self {
            UnitType::HostMgr | UnitType::HostSvc | UnitType::HostApp => VmClass::Host,
            UnitType::AdmVm | UnitType::AdmVmMgr | UnitType::AdmVmSvc | UnitType::AdmVmApp => {
                VmClass::AdmVm
            }
            UnitType::SysVm | UnitType::SysVmMgr | UnitType::SysVmSvc | UnitType::SysVmApp => {
                VmClass::SysVm
            }
            UnitType::AppVm | UnitType::AppVmMgr | UnitType::AppVmSvc | UnitType::AppVmApp => {
                VmClass::AppVm
            }
        }
    }

    pub fn unit_class(self) -> UnitClass {
        match self {
            UnitType::AdmVm | UnitType::SysVm | UnitType::AppVm => UnitClass::Vm,
            UnitType::HostMgr | UnitType::AdmVmMgr | UnitType::SysVmMgr | UnitType::AppVmMgr => {
                UnitClass::Manager
            }
            UnitType::HostSvc | UnitType::AdmVmSvc | UnitType::SysVmSvc | UnitType::AppVmSvc => {
                UnitClass::Service
            }
            UnitType::HostApp | UnitType::AdmVmApp | UnitType::SysVmApp | UnitType::AppVmApp => {
                UnitClass::Application
            }
        }
    }

    pub fn is_manager(self) -> bool {
        self.unit_class() == UnitClass::Manager
    }

    pub fn is_vm(self) -> bool {
        self.unit_class() == UnitClass::Vm
    }

    pub fn is_service(self) -> bool {
        self.unit_class() == UnitClass::Service
    }

    pub fn is_application(self) -> bool {
        self.unit_class() == UnitClass::Application
    }

    /// Canonical upper-case name, e.g. `APPVM_MGR`.
    pub fn name(self) -> &'static str {
        match self {
            UnitType::HostMgr => "HOST_MGR",
            UnitType::HostSvc => "HOST_SVC",
            UnitType::HostApp => "HOST_APP",
            UnitType::AdmVm => "ADMVM",
            UnitType::AdmVmMgr => "ADMVM_MGR",
            UnitType::AdmVmSvc => "ADMVM_SVC",
            UnitType::AdmVmApp => "ADMVM_APP",
            UnitType::SysVm => "SYSVM",
            UnitType::SysVmMgr => "SYSVM_MGR",
            UnitType::SysVmSvc => "SYSVM_SVC",
            UnitType::SysVmApp => "SYSVM_APP",
            UnitType::AppVm => "APPVM",
            UnitType::AppVmMgr => "APPVM_MGR",
            UnitType::AppVmSvc => "APPVM_SVC",
            UnitType::AppVmApp => "APPVM_APP",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, UnitTypeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnitTypeError::UnknownName(name.to_string()))
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for VmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmClass::Host => "Host",
            VmClass::AdmVm => "AdmVM",
            VmClass::SysVm => "SysVM",
            VmClass::AppVm => "AppVM",
        };
        f.write_str(s)
    }
}

impl fmt::Display for UnitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitClass::Vm => "VM",
            UnitClass::Manager => "Mgr",
            UnitClass::Service => "Svc",
            UnitClass::Application => "App",
        };
        f.write_str(s)
    }
}

impl TryFrom<u32> for UnitType {
    type Error = UnitTypeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value)
    }
}

impl From<UnitType> for u32 {
    fn from(value: UnitType) -> Self {
        value.as_u32()
    }
}

#[cfg(test)]
#[path = "unit_type_tests.rs"]
mod tests;
