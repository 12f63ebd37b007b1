// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration.
//!
//! The JSON file is the canonical source. The legacy environment loader in
//! [`env`] produces the same [`AgentConfig`], and both paths finish in
//! [`AgentConfig::validate`].

pub mod env;

use std::path::{Path, PathBuf};

use givc_core::{
    agent_service_name, validate_application_manifests, ApplicationManifest, ArgumentValidator, ManifestError,
    TransportConfig, TransportError, UnitType, UnitTypeError,
};
use givc_wire::TlsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("malformed configuration: {0}")]
    Json(String),
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },
    #[error(transparent)]
    UnitType(#[from] UnitTypeError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("{field}: {source}")]
    Transport {
        field: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    /// Type given to the units this agent registers on its own behalf
    pub sub_type: UnitType,
    #[serde(default)]
    pub parent: String,
    /// VM or host name; empty falls back to the agent endpoint name
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub admin_endpoint: TransportConfig,
    pub agent_endpoint: TransportConfig,
    #[serde(default)]
    pub tls_config: TlsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmServices {
    #[serde(default)]
    pub admin_vm: String,
    #[serde(default)]
    pub system_vms: Vec<String>,
    #[serde(default)]
    pub app_vms: Vec<String>,
}

/// One bridged input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProxyConfig {
    pub transport: TransportConfig,
    /// `true` reads a local device and forwards it; `false` exposes a virtual one
    #[serde(default)]
    pub producer: bool,
    /// Case-insensitive substring of the device name
    #[serde(default)]
    pub device: String,
}

/// One bridged Unix socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketProxyConfig {
    pub transport: TransportConfig,
    /// `true` dials `socket` for each incoming stream; `false` listens on it
    #[serde(default)]
    pub server: bool,
    pub socket: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProxies {
    #[serde(default)]
    pub events: Vec<EventProxyConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketProxies {
    #[serde(default)]
    pub sockets: Vec<SocketProxyConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub vm_services: VmServices,
    #[serde(default)]
    pub applications: Vec<ApplicationManifest>,
    /// Schemes accepted in `url` arguments besides http and https; unset keeps the defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_schemes: Option<Vec<String>>,
    #[serde(default)]
    pub exec: bool,
    #[serde(default)]
    pub wifi: bool,
    #[serde(default)]
    pub ctap: bool,
    #[serde(default)]
    pub hwid: bool,
    /// Interface whose MAC is the hardware id; empty picks the first wireless one
    #[serde(default)]
    pub hwid_interface: String,
    #[serde(default)]
    pub notifier: bool,
    #[serde(default)]
    pub notifier_socket_dir: String,
    #[serde(default)]
    pub event_proxy: EventProxies,
    #[serde(default)]
    pub socket_proxy: SocketProxies,
    #[serde(default)]
    pub policy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub identity: Identity,
    pub network: Network,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub runtime: Runtime,
}

impl AgentConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: AgentConfig = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json(&json)
    }

    fn normalize(&mut self) {
        if self.identity.name.is_empty() {
            self.identity.name = self.network.agent_endpoint.name.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.name.is_empty() {
            return Err(ConfigError::Invalid("agent name is empty".to_string()));
        }
        self.network
            .agent_endpoint
            .endpoint()
            .map_err(|source| ConfigError::Transport { field: "agentEndpoint", source })?;
        self.network
            .admin_endpoint
            .endpoint()
            .map_err(|source| ConfigError::Transport { field: "adminEndpoint", source })?;

        let tls = &self.network.tls_config;
        if tls.enable
            && [&tls.ca_cert_path, &tls.cert_path, &tls.key_path].iter().any(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid("TLS enabled without caCertPath, certPath and keyPath".to_string()));
        }

        validate_application_manifests(&self.capabilities.applications)?;

        for proxy in &self.capabilities.socket_proxy.sockets {
            if !proxy.socket.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "socket proxy path {} is not absolute",
                    proxy.socket.display()
                )));
            }
            if !proxy.server {
                proxy
                    .transport
                    .endpoint()
                    .map_err(|source| ConfigError::Transport { field: "socketProxy.transport", source })?;
            }
        }
        for proxy in &self.capabilities.event_proxy.events {
            if proxy.producer && proxy.device.is_empty() {
                return Err(ConfigError::Invalid("event producer without a device name".to_string()));
            }
            proxy.transport.endpoint().map_err(|source| ConfigError::Transport { field: "eventProxy.transport", source })?;
        }
        if self.capabilities.notifier && self.capabilities.notifier_socket_dir.is_empty() {
            return Err(ConfigError::Invalid("notifier enabled without notifierSocketDir".to_string()));
        }
        Ok(())
    }

    /// `givc-<name>.service`
    pub fn service_name(&self) -> String {
        agent_service_name(&self.identity.name)
    }

    /// Transport the agent serves on, named after the agent.
    pub fn agent_transport(&self) -> TransportConfig {
        let transport = &self.network.agent_endpoint;
        if transport.name.is_empty() {
            transport.with_name(&self.identity.name)
        } else {
            transport.clone()
        }
    }

    /// Units registered with the admin on the agent's behalf, with their types.
    pub fn managed_units(&self) -> Vec<(String, UnitType)> {
        let caps = &self.capabilities;
        let mut units: Vec<(String, UnitType)> =
            caps.services.iter().map(|s| (s.clone(), self.identity.sub_type)).collect();
        let vms = &caps.vm_services;
        if !vms.admin_vm.is_empty() {
            units.push((vms.admin_vm.clone(), UnitType::AdmVm));
        }
        units.extend(vms.system_vms.iter().map(|s| (s.clone(), UnitType::SysVm)));
        units.extend(vms.app_vms.iter().map(|s| (s.clone(), UnitType::AppVm)));
        units
    }

    /// Unit names the controller may act on; application names act as
    /// instance bases.
    pub fn whitelist(&self) -> Vec<String> {
        let mut names: Vec<String> = self.managed_units().into_iter().map(|(name, _)| name).collect();
        names.push(self.service_name());
        names.extend(self.capabilities.applications.iter().map(|app| app.name.clone()));
        names.sort();
        names.dedup();
        names
    }

    /// Validator for application launches on this agent.
    pub fn argument_validator(&self) -> ArgumentValidator {
        let validator = ArgumentValidator::new(self.capabilities.applications.clone());
        match &self.capabilities.url_schemes {
            Some(schemes) => validator.with_url_schemes(schemes.iter().cloned()),
            None => validator,
        }
    }

    /// Enabled capabilities that this agent does not serve.
    pub fn unsupported_capabilities(&self) -> Vec<&'static str> {
        let caps = &self.capabilities;
        [("ctap", caps.ctap), ("policy", caps.policy)]
            .into_iter()
            .filter_map(|(name, enabled)| enabled.then_some(name))
            .collect()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
