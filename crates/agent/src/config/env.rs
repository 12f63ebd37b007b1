// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy environment-variable configuration.
//!
//! Structured values (`AGENT`, `ADMIN_SERVER`, `TLS_CONFIG`, `APPLICATIONS`,
//! `EVENT_PROXY`, `SOCKET_PROXY`) are JSON; unit lists are whitespace
//! separated; feature switches are on when present and not `false`.

use givc_core::manifest::parse_application_manifests;
use givc_core::{TransportConfig, UnitType};
use givc_wire::TlsConfig;
use serde::de::DeserializeOwned;

use super::{
    AgentConfig, Capabilities, ConfigError, EventProxies, EventProxyConfig, Identity, Network, Runtime,
    SocketProxies, SocketProxyConfig, VmServices,
};

/// Build the configuration from the process environment.
pub fn from_process_env() -> Result<AgentConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build the configuration from `lookup`, which maps variable names to values.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AgentConfig, ConfigError> {
    let agent: TransportConfig = required_json(&lookup, "AGENT")?;
    let admin: TransportConfig = required_json(&lookup, "ADMIN_SERVER")?;
    let unit_type = parse_unit_type(&lookup, "TYPE")?;
    let sub_type = parse_unit_type(&lookup, "SUBTYPE")?;

    let tls_config: TlsConfig = optional_json(&lookup, "TLS_CONFIG")?.unwrap_or_default();
    let applications = match lookup("APPLICATIONS").filter(|s| !s.trim().is_empty()) {
        Some(json) => parse_application_manifests(&json)?,
        None => Vec::new(),
    };
    let events: Vec<EventProxyConfig> = optional_json(&lookup, "EVENT_PROXY")?.unwrap_or_default();
    let sockets: Vec<SocketProxyConfig> = optional_json(&lookup, "SOCKET_PROXY")?.unwrap_or_default();

    let notifier_socket_dir = lookup("NOTIFIER_SOCKET_DIR").unwrap_or_default();
    let capabilities = Capabilities {
        services: words(&lookup, "SERVICES"),
        vm_services: VmServices {
            admin_vm: words(&lookup, "ADMVMS").into_iter().next().unwrap_or_default(),
            system_vms: words(&lookup, "SYSVMS"),
            app_vms: words(&lookup, "APPVMS"),
        },
        applications,
        url_schemes: lookup("URL_SCHEMES").is_some().then(|| words(&lookup, "URL_SCHEMES")),
        exec: switch(&lookup, "EXEC"),
        wifi: switch(&lookup, "WIFI"),
        ctap: false,
        hwid: switch(&lookup, "HWID"),
        hwid_interface: lookup("HWID_IFACE").unwrap_or_default(),
        notifier: switch(&lookup, "NOTIFIER") && !notifier_socket_dir.is_empty(),
        notifier_socket_dir,
        event_proxy: EventProxies { events },
        socket_proxy: SocketProxies { sockets },
        policy: switch(&lookup, "POLICY_AGENT"),
    };

    let config = AgentConfig {
        identity: Identity {
            unit_type,
            sub_type,
            parent: lookup("PARENT").unwrap_or_default(),
            name: agent.name.clone(),
        },
        network: Network { admin_endpoint: admin, agent_endpoint: agent, tls_config },
        capabilities,
        runtime: Runtime { debug: lookup("DEBUG").as_deref() == Some("true") },
    };
    config.validate()?;
    Ok(config)
}

fn required_json<T: DeserializeOwned>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<T, ConfigError> {
    optional_json(lookup, var)?.ok_or(ConfigError::MissingEnv(var))
}

fn optional_json<T: DeserializeOwned>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var).filter(|s| !s.trim().is_empty()) {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnv { var, reason: e.to_string() }),
        None => Ok(None),
    }
}

fn parse_unit_type(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<UnitType, ConfigError> {
    let raw = lookup(var).ok_or(ConfigError::MissingEnv(var))?;
    let code = raw
        .trim()
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnv { var, reason: format!("'{}': {}", raw, e) })?;
    Ok(UnitType::from_u32(code)?)
}

fn words(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Vec<String> {
    lookup(var).map(|s| s.split_whitespace().map(str::to_string).collect()).unwrap_or_default()
}

fn switch(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> bool {
    lookup(var).is_some_and(|v| v != "false")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
