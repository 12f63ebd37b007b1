// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual-TLS credentials.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("{0} is not a PEM file")]
    NotPem(PathBuf),
    #[error("TLS enabled but {0} path is empty")]
    MissingPath(&'static str),
}

/// Paths of the CA bundle and this endpoint's certificate and key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub ca_cert_path: PathBuf,
    #[serde(default)]
    pub cert_path: PathBuf,
    #[serde(default)]
    pub key_path: PathBuf,
}

/// Credentials read from disk, ready for server or client use.
#[derive(Debug, Clone)]
pub struct TlsCredentials {
    ca: Certificate,
    identity: Identity,
}

impl TlsConfig {
    pub fn new(ca: impl Into<PathBuf>, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self { enable: true, ca_cert_path: ca.into(), cert_path: cert.into(), key_path: key.into() }
    }

    /// Read and sanity-check all three files. `None` when TLS is disabled.
    pub fn load(&self) -> Result<Option<TlsCredentials>, TlsError> {
        if !self.enable {
            return Ok(None);
        }
        let ca = read_pem(&self.ca_cert_path, "caCertPath")?;
        let cert = read_pem(&self.cert_path, "certPath")?;
        let key = read_pem(&self.key_path, "keyPath")?;
        Ok(Some(TlsCredentials { ca: Certificate::from_pem(ca), identity: Identity::from_pem(cert, key) }))
    }
}

impl TlsCredentials {
    /// Server side: present our identity, require client certificates signed by the CA.
    pub fn server_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new().identity(self.identity.clone()).client_ca_root(self.ca.clone())
    }

    /// Client side: verify the server as `domain`, present our identity.
    pub fn client_config(&self, domain: &str) -> ClientTlsConfig {
        ClientTlsConfig::new()
            .ca_certificate(self.ca.clone())
            .identity(self.identity.clone())
            .domain_name(domain)
    }
}

fn read_pem(path: &Path, field: &'static str) -> Result<Vec<u8>, TlsError> {
    if path.as_os_str().is_empty() {
        return Err(TlsError::MissingPath(field));
    }
    let bytes = std::fs::read(path).map_err(|e| TlsError::Read(path.to_path_buf(), e))?;
    if !bytes.windows(10).any(|w| w == b"-----BEGIN") {
        return Err(TlsError::NotPem(path.to_path_buf()));
    }
    Ok(bytes)
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tests;
