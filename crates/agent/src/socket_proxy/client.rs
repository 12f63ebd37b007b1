// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client mode: listen on a local socket and tunnel each accepted connection
//! through its own `TransferData` stream.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use givc_wire::pb::socket::socket_stream_client::SocketStreamClient;
use givc_wire::pb::socket::BytePacket;
use givc_wire::EndpointConfig;
use nix::unistd::{chown, Gid};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::Streaming;
use tracing::{debug, info, warn};

use super::{splice, ProxyError, SOCKET_GID, SOCKET_MODE};

/// Delay between attempts to open the remote stream.
pub const STREAM_RETRY_INTERVAL: Duration = Duration::from_secs(1);

const OUTBOUND_QUEUE: usize = 16;

pub struct SocketProxyClient {
    socket: PathBuf,
    endpoint: EndpointConfig,
    retry_interval: Duration,
}

impl SocketProxyClient {
    pub fn new(socket: impl Into<PathBuf>, endpoint: EndpointConfig) -> Self {
        Self { socket: socket.into(), endpoint, retry_interval: STREAM_RETRY_INTERVAL }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Accept local connections until `cancel` fires. The socket file is
    /// removed on return.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ProxyError> {
        let listener = bind_local(&self.socket)?;
        let channel = self.endpoint.connect()?;
        info!(socket = %self.socket.display(), remote = %self.endpoint.transport.name, "socket proxy listening");

        loop {
            let conn = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            match conn {
                Ok((stream, _)) => {
                    debug!(socket = %self.socket.display(), "accepted local connection");
                    let client = SocketStreamClient::new(channel.clone());
                    tokio::spawn(tunnel(stream, client, self.retry_interval, cancel.child_token()));
                }
                Err(e) => {
                    warn!(socket = %self.socket.display(), "accept failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }

        drop(listener);
        let _ = std::fs::remove_file(&self.socket);
        Ok(())
    }
}

/// Listen on `path`, replacing a stale socket file, and open it to the
/// shared group. Ownership and mode failures are logged only.
pub fn bind_local(path: &Path) -> Result<UnixListener, ProxyError> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(ProxyError::Socket { path: path.to_path_buf(), source }),
    }
    let listener = UnixListener::bind(path).map_err(|source| ProxyError::Socket { path: path.to_path_buf(), source })?;
    share_socket(path);
    Ok(listener)
}

/// Give `path` to [`SOCKET_GID`] with [`SOCKET_MODE`].
pub(crate) fn share_socket(path: &Path) {
    if let Err(e) = chown(path, None, Some(Gid::from_raw(SOCKET_GID))) {
        warn!(path = %path.display(), "failed to chown socket: {}", e);
    }
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(SOCKET_MODE)) {
        warn!(path = %path.display(), "failed to chmod socket: {}", e);
    }
}

async fn tunnel(
    local: UnixStream,
    mut client: SocketStreamClient<Channel>,
    retry_interval: Duration,
    cancel: CancellationToken,
) {
    let (outbound, inbound) = match open_stream(&mut client, retry_interval, &cancel).await {
        Some(pair) => pair,
        None => return,
    };
    if let Err(e) = splice(local, inbound, outbound, cancel).await {
        debug!("tunnel closed: {}", e);
    }
}

/// Open `TransferData`, retrying until it succeeds or `cancel` fires.
async fn open_stream(
    client: &mut SocketStreamClient<Channel>,
    retry_interval: Duration,
    cancel: &CancellationToken,
) -> Option<(mpsc::Sender<BytePacket>, Streaming<BytePacket>)> {
    loop {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let attempt = tokio::select! {
            _ = cancel.cancelled() => return None,
            res = client.transfer_data(ReceiverStream::new(rx)) => res,
        };
        match attempt {
            Ok(resp) => return Some((tx, resp.into_inner())),
            Err(status) => {
                warn!(code = ?status.code(), "failed to open remote stream: {}", status.message());
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(retry_interval) => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
