// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit naming conventions shared by admin and agents.

const AGENT_PREFIX: &str = "givc-";
const VM_PREFIX: &str = "microvm@";
const SERVICE_SUFFIX: &str = ".service";

/// Service name of the agent running inside `vm`.
pub fn agent_service_name(vm: &str) -> String {
    format!("{}{}{}", AGENT_PREFIX, vm, SERVICE_SUFFIX)
}

/// Host unit that runs `vm`.
pub fn vm_service_name(vm: &str) -> String {
    format!("{}{}{}", VM_PREFIX, vm, SERVICE_SUFFIX)
}

/// Inverse of [`agent_service_name`].
pub fn vm_from_agent_service(name: &str) -> Option<&str> {
    name.strip_prefix(AGENT_PREFIX)?.strip_suffix(SERVICE_SUFFIX).filter(|vm| !vm.is_empty())
}

/// Inverse of [`vm_service_name`].
pub fn vm_from_vm_service(name: &str) -> Option<&str> {
    name.strip_prefix(VM_PREFIX)?.strip_suffix(SERVICE_SUFFIX).filter(|vm| !vm.is_empty())
}

/// Split `app@instance.service` into `(app, instance)`.
pub fn parse_instance_name(name: &str) -> Option<(&str, &str)> {
    let (base, rest) = name.split_once('@')?;
    let instance = rest.strip_suffix(SERVICE_SUFFIX)?;
    if base.is_empty() || instance.is_empty() {
        return None;
    }
    Some((base, instance))
}

/// Application reference in the `name` or `name:vm` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRef {
    pub name: String,
    vm: Option<String>,
}

impl AppRef {
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((name, vm)) if !vm.is_empty() => {
                Self { name: name.to_string(), vm: Some(vm.to_string()) }
            }
            Some((name, _)) => Self { name: name.to_string(), vm: None },
            None => Self { name: value.to_string(), vm: None },
        }
    }

    /// Explicit VM if one was given.
    pub fn explicit_vm(&self) -> Option<&str> {
        self.vm.as_deref()
    }

    /// VM to start the application in; bare names imply `<name>-vm`.
    pub fn launch_vm(&self) -> String {
        self.vm.clone().unwrap_or_else(|| format!("{}-vm", self.name))
    }

    /// VM for control of a running application; bare names use the name itself.
    pub fn control_vm(&self) -> String {
        self.vm.clone().unwrap_or_else(|| self.name.clone())
    }

    /// True when the name addresses one instance (`app@N.service`).
    pub fn is_instance(&self) -> bool {
        self.name.contains('@')
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
