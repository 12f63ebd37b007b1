// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener binding and the gRPC serve loop.
//!
//! One listener type covers tcp, unix and vsock so every daemon serves its
//! services the same way regardless of transport.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use givc_core::{EndpointAddress, Protocol, TransportConfig, TransportError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tokio_vsock::{VsockAddr, VsockListener, VsockStream};
use tonic::service::Routes;
use tonic::transport::server::Connected;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::security::PeerInfo;
use crate::tls::TlsCredentials;

/// Bind attempts before giving up.
pub const BIND_ATTEMPTS: u32 = 20;

/// Delay between bind attempts.
pub const BIND_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to bind {0}: {1}")]
    Bind(String, #[source] io::Error),
    #[error("rpc server error: {0}")]
    Tonic(#[from] tonic::transport::Error),
}

/// Accepted connection on any supported transport.
#[derive(Debug)]
pub enum ServerStream {
    Tcp(TcpStream),
    Unix(UnixStream),
    Vsock(VsockStream),
}

impl Connected for ServerStream {
    type ConnectInfo = PeerInfo;

    fn connect_info(&self) -> Self::ConnectInfo {
        match self {
            ServerStream::Tcp(s) => PeerInfo { protocol: Protocol::Tcp, remote: s.peer_addr().ok() },
            ServerStream::Unix(_) => PeerInfo::local(Protocol::Unix),
            ServerStream::Vsock(_) => PeerInfo::local(Protocol::Vsock),
        }
    }
}

impl AsyncRead for ServerStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ServerStream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            ServerStream::Unix(s) => Pin::new(s).poll_read(cx, buf),
            ServerStream::Vsock(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ServerStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            ServerStream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            ServerStream::Unix(s) => Pin::new(s).poll_write(cx, buf),
            ServerStream::Vsock(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ServerStream::Tcp(s) => Pin::new(s).poll_flush(cx),
            ServerStream::Unix(s) => Pin::new(s).poll_flush(cx),
            ServerStream::Vsock(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ServerStream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            ServerStream::Unix(s) => Pin::new(s).poll_shutdown(cx),
            ServerStream::Vsock(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Bound listener on any supported transport.
pub enum GrpcListener {
    Tcp(TcpListener),
    Unix(UnixListener, PathBuf),
    Vsock(VsockListener),
}

impl GrpcListener {
    pub async fn accept(&mut self) -> io::Result<ServerStream> {
        match self {
            GrpcListener::Tcp(l) => l.accept().await.map(|(s, _)| ServerStream::Tcp(s)),
            GrpcListener::Unix(l, _) => l.accept().await.map(|(s, _)| ServerStream::Unix(s)),
            GrpcListener::Vsock(l) => l.accept().await.map(|(s, _)| ServerStream::Vsock(s)),
        }
    }

    /// Bound TCP address (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            GrpcListener::Tcp(l) => l.local_addr().ok(),
            _ => None,
        }
    }

    async fn bind_once(address: &EndpointAddress) -> io::Result<Self> {
        match address {
            EndpointAddress::Tcp { host, port } => {
                Ok(GrpcListener::Tcp(TcpListener::bind((host.as_str(), *port)).await?))
            }
            EndpointAddress::Unix(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                }
                Ok(GrpcListener::Unix(UnixListener::bind(path)?, path.clone()))
            }
            EndpointAddress::Vsock { cid, port } => {
                Ok(GrpcListener::Vsock(VsockListener::bind(VsockAddr::new(*cid, *port))?))
            }
        }
    }
}

impl Drop for GrpcListener {
    fn drop(&mut self) {
        if let GrpcListener::Unix(_, path) = self {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Bind `transport`, retrying [`BIND_ATTEMPTS`] times.
pub async fn bind(transport: &TransportConfig) -> Result<GrpcListener, ServeError> {
    bind_with_retry(transport, BIND_ATTEMPTS, BIND_RETRY_INTERVAL).await
}

pub async fn bind_with_retry(
    transport: &TransportConfig,
    attempts: u32,
    interval: Duration,
) -> Result<GrpcListener, ServeError> {
    let address = transport.endpoint()?;
    let mut attempt = 1;
    loop {
        match GrpcListener::bind_once(&address).await {
            Ok(listener) => {
                info!(%address, "listening");
                return Ok(listener);
            }
            Err(e) if attempt >= attempts.max(1) => {
                return Err(ServeError::Bind(address.to_string(), e));
            }
            Err(e) => {
                warn!(%address, attempt, "bind failed: {}", e);
                attempt += 1;
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Serve `routes` on `listener` until `cancel` fires, then drain in-flight calls.
pub async fn serve(
    listener: GrpcListener,
    routes: Routes,
    tls: Option<&TlsCredentials>,
    cancel: CancellationToken,
) -> Result<(), ServeError> {
    let mut builder = Server::builder();
    if let Some(tls) = tls {
        builder = builder.tls_config(tls.server_config())?;
    }

    let incoming = Box::pin(futures_util::stream::unfold(listener, |mut listener| async move {
        loop {
            match listener.accept().await {
                Ok(stream) => return Some((Ok::<_, io::Error>(stream), listener)),
                Err(e) => {
                    warn!("accept error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }));

    builder
        .add_routes(routes)
        .serve_with_incoming_shutdown(incoming, async move { cancel.cancelled().await })
        .await?;
    info!("rpc server stopped");
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
