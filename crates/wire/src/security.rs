// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Peer authentication for incoming calls.
//!
//! With TLS on, the client certificate's subject-alternative names are
//! attached to every request as [`SecurityInfo`]. TCP peers must connect from
//! an address listed in those names; vsock and unix peers are trusted by
//! transport.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use givc_core::Protocol;
use thiserror::Error;
use tonic::service::Interceptor;
use tonic::transport::server::TlsConnectInfo;
use tonic::{Request, Status};
use tracing::{debug, warn};
use x509_parser::extensions::GeneralName;

/// Connection metadata recorded by the server stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub protocol: Protocol,
    pub remote: Option<SocketAddr>,
}

impl PeerInfo {
    pub fn tcp(remote: SocketAddr) -> Self {
        Self { protocol: Protocol::Tcp, remote: Some(remote) }
    }

    pub fn local(protocol: Protocol) -> Self {
        Self { protocol, remote: None }
    }
}

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("failed to parse peer certificate: {0}")]
    Parse(String),
}

/// Identity claims taken from the peer certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityInfo {
    /// False when the server runs without TLS
    pub enabled: bool,
    pub dns_names: Vec<String>,
    pub ip_addrs: Vec<IpAddr>,
}

impl SecurityInfo {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_der(der: &[u8]) -> Result<Self, SecurityError> {
        let (_, cert) =
            x509_parser::parse_x509_certificate(der).map_err(|e| SecurityError::Parse(e.to_string()))?;
        let mut info = Self { enabled: true, ..Default::default() };
        let san = cert.subject_alternative_name().map_err(|e| SecurityError::Parse(e.to_string()))?;
        for name in san.iter().flat_map(|ext| ext.value.general_names.iter()) {
            match name {
                GeneralName::DNSName(dns) => info.dns_names.push(dns.to_string()),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        info.ip_addrs.push(ip);
                    }
                }
                _ => {}
            }
        }
        Ok(info)
    }

    /// True if `ip` is one of the certificate's IP SANs.
    pub fn check_address(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.ip_addrs.iter().any(|known| known.to_canonical() == ip)
    }
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        16 => <[u8; 16]>::try_from(bytes).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
        _ => None,
    }
}

/// Attaches [`SecurityInfo`] to each request and enforces the TCP address rule.
#[derive(Debug, Clone, Copy)]
pub struct AuthInterceptor {
    tls: bool,
}

impl AuthInterceptor {
    pub fn new(tls: bool) -> Self {
        Self { tls }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if !self.tls {
            request.extensions_mut().insert(SecurityInfo::disabled());
            return Ok(request);
        }

        let info = authenticate(&request)?;
        request.extensions_mut().insert(info);
        Ok(request)
    }
}

fn authenticate(request: &Request<()>) -> Result<SecurityInfo, Status> {
    let conn = request
        .extensions()
        .get::<TlsConnectInfo<PeerInfo>>()
        .ok_or_else(|| Status::unauthenticated("no TLS connection info"))?;
    let certs = conn.peer_certs().ok_or_else(|| Status::unauthenticated("no peer certificate"))?;
    let info = certs
        .iter()
        .find_map(|der| match SecurityInfo::from_der(der.as_ref()) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("skipping peer certificate: {}", e);
                None
            }
        })
        .ok_or_else(|| Status::unauthenticated("no parseable peer certificate"))?;

    let peer = conn.get_ref();
    if peer.protocol == Protocol::Tcp {
        let Some(remote) = peer.remote else {
            return Err(Status::permission_denied("peer address unknown"));
        };
        if !info.check_address(remote.ip()) {
            warn!(peer = %remote, "peer address not in certificate");
            return Err(Status::permission_denied(format!(
                "peer address {} not present in certificate",
                remote.ip()
            )));
        }
    }
    Ok(info)
}

#[cfg(test)]
#[path = "security_tests.rs"]
mod tests;
