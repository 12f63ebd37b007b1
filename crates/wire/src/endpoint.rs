// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound channels over tcp, unix and vsock.

use std::time::Duration;

use givc_core::{EndpointAddress, TransportConfig, TransportError};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio_vsock::{VsockAddr, VsockStream};
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

use crate::tls::{TlsCredentials, TlsError};

/// Time allowed to establish a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(300);

/// Maximum in-flight requests per channel.
pub const CONCURRENCY_LIMIT: usize = 30;

#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("rpc transport error: {0}")]
    Tonic(#[from] tonic::transport::Error),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where and how to reach a peer.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub transport: TransportConfig,
    pub tls: Option<TlsCredentials>,
    pub connect_timeout: Duration,
}

impl EndpointConfig {
    pub fn new(transport: TransportConfig, tls: Option<TlsCredentials>) -> Self {
        Self { transport, tls, connect_timeout: CONNECT_TIMEOUT }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// URI handed to tonic. Unix and vsock use a placeholder authority; the
    /// connector ignores it.
    fn uri(&self, address: &EndpointAddress) -> String {
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        match address {
            EndpointAddress::Tcp { .. } => format!("{}://{}", scheme, address),
            EndpointAddress::Unix(_) | EndpointAddress::Vsock { .. } => format!("{}://[::]:443", scheme),
        }
    }

    /// Build a lazily connecting channel. Connection failures surface as
    /// `Unavailable` on the first call.
    pub fn connect(&self) -> Result<Channel, WireError> {
        let address = self.transport.endpoint()?;
        let mut endpoint = Endpoint::from_shared(self.uri(&address))?
            .connect_timeout(self.connect_timeout)
            .concurrency_limit(CONCURRENCY_LIMIT);
        if let Some(tls) = &self.tls {
            endpoint = endpoint.tls_config(tls.client_config(&self.transport.name))?;
        }

        tracing::debug!(target = %address, "configuring channel");
        let channel = match address {
            EndpointAddress::Tcp { .. } => endpoint.connect_lazy(),
            EndpointAddress::Unix(path) => endpoint.connect_with_connector_lazy(service_fn(move |_: Uri| {
                let path = path.clone();
                async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?)) }
            })),
            EndpointAddress::Vsock { cid, port } => {
                endpoint.connect_with_connector_lazy(service_fn(move |_: Uri| async move {
                    let stream = VsockStream::connect(VsockAddr::new(cid, port)).await?;
                    Ok::<_, std::io::Error>(TokioIo::new(stream))
                }))
            }
        };
        Ok(channel)
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
