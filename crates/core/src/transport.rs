// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport configuration shared by listeners and peers.
//!
//! A [`TransportConfig`] is the loose form carried in configuration files and
//! on the wire (the port is a string, the address depends on the protocol).
//! [`TransportConfig::endpoint`] resolves it into an [`EndpointAddress`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Well-known vsock context ids.
pub const VSOCK_CID_LOCAL: u32 = 1;
pub const VSOCK_CID_HOST: u32 = 2;
pub const VSOCK_CID_ANY: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Vsock,
    Unix,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Vsock => "vsock",
            Protocol::Unix => "unix",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "vsock" => Ok(Protocol::Vsock),
            "unix" => Ok(Protocol::Unix),
            other => Err(TransportError::UnknownProtocol(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("unsupported protocol: {0}")]
    UnknownProtocol(String),
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("invalid vsock context id '{0}'")]
    InvalidCid(String),
    #[error("transport has no address")]
    MissingAddress,
    #[error("invalid listen address '{0}'")]
    InvalidListen(String),
}

/// Address and protocol of an RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Peer name; doubles as the TLS server name
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "addr", alias = "address")]
    pub address: String,
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: String,
    #[serde(default)]
    pub protocol: Protocol,
}

/// Resolved endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointAddress {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
    Vsock { cid: u32, port: u32 },
}

impl TransportConfig {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        Self { name: name.into(), address: address.into(), port: port.into(), protocol }
    }

    /// Unix-socket transport; the socket path is the address.
    pub fn unix(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, "", Protocol::Unix)
    }

    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
    }

    pub fn endpoint(&self) -> Result<EndpointAddress, TransportError> {
        if self.address.is_empty() {
            return Err(TransportError::MissingAddress);
        }
        match self.protocol {
            Protocol::Tcp => {
                let port = self
                    .port
                    .parse::<u16>()
                    .map_err(|_| TransportError::InvalidPort(self.port.clone()))?;
                Ok(EndpointAddress::Tcp { host: self.address.clone(), port })
            }
            Protocol::Unix => Ok(EndpointAddress::Unix(PathBuf::from(&self.address))),
            Protocol::Vsock => {
                let cid = parse_cid(&self.address)?;
                let port = self
                    .port
                    .parse::<u32>()
                    .map_err(|_| TransportError::InvalidPort(self.port.clone()))?;
                Ok(EndpointAddress::Vsock { cid, port })
            }
        }
    }

    /// Same endpoint, different name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self.clone() }
    }

    /// Parse a listen spec: `host:port`, `unix:/path` or `vsock:cid:port`.
    pub fn parse_listen(name: &str, spec: &str) -> Result<Self, TransportError> {
        if let Some(path) = spec.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(TransportError::InvalidListen(spec.to_string()));
            }
            return Ok(Self::unix(name, path));
        }
        if let Some(rest) = spec.strip_prefix("vsock:") {
            let (cid, port) =
                rest.split_once(':').ok_or_else(|| TransportError::InvalidListen(spec.to_string()))?;
            let transport = Self::new(name, cid, port, Protocol::Vsock);
            transport.endpoint()?;
            return Ok(transport);
        }
        let (host, port) =
            spec.rsplit_once(':').ok_or_else(|| TransportError::InvalidListen(spec.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let transport = Self::new(name, host, port, Protocol::Tcp);
        transport.endpoint()?;
        Ok(transport)
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.endpoint() {
            Ok(endpoint) => write!(f, "{}", endpoint),
            Err(_) => write!(f, "{}:{}:{}", self.protocol, self.address, self.port),
        }
    }
}

impl EndpointAddress {
    pub fn protocol(&self) -> Protocol {
        match self {
            EndpointAddress::Tcp { .. } => Protocol::Tcp,
            EndpointAddress::Unix(_) => Protocol::Unix,
            EndpointAddress::Vsock { .. } => Protocol::Vsock,
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointAddress::Tcp { host, port } if host.contains(':') => {
                write!(f, "[{}]:{}", host, port)
            }
            EndpointAddress::Tcp { host, port } => write!(f, "{}:{}", host, port),
            EndpointAddress::Unix(path) => write!(f, "unix:{}", path.display()),
            EndpointAddress::Vsock { cid, port } => write!(f, "passthrough:vsock:{}:{}", cid, port),
        }
    }
}

fn parse_cid(address: &str) -> Result<u32, TransportError> {
    match address {
        "host" => Ok(VSOCK_CID_HOST),
        "local" => Ok(VSOCK_CID_LOCAL),
        "any" => Ok(VSOCK_CID_ANY),
        other => other.parse::<u32>().map_err(|_| TransportError::InvalidCid(other.to_string())),
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
