// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server mode: answer `TransferData` by dialing the local socket.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use givc_wire::pb::socket::socket_stream_server::{SocketStream, SocketStreamServer};
use givc_wire::pb::socket::BytePacket;
use givc_wire::AuthInterceptor;
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use super::client::share_socket;
use super::splice;

/// Poll interval when the socket directory cannot be watched.
pub const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(500);

const OUTBOUND_QUEUE: usize = 16;

type PacketStream = Pin<Box<dyn Stream<Item = Result<BytePacket, Status>> + Send>>;

#[derive(Clone)]
pub struct SocketProxyServer {
    socket: PathBuf,
    cancel: CancellationToken,
}

impl SocketProxyServer {
    pub fn new(socket: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self { socket: socket.into(), cancel }
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<SocketStreamServer<Self>, AuthInterceptor> {
        SocketStreamServer::with_interceptor(self, AuthInterceptor::new(tls))
    }
}

/// Wait for the local service to create `socket`, then open it to the
/// shared group. Returns `false` if cancelled first.
pub async fn share_when_ready(socket: PathBuf, cancel: CancellationToken) -> bool {
    let ready = match watch_parent(&socket) {
        Ok((watcher, created)) => wait_for_create(&socket, watcher, created, &cancel).await,
        Err(e) => {
            warn!(socket = %socket.display(), "cannot watch socket directory, polling instead: {}", e);
            poll_for(&socket, &cancel).await
        }
    };
    if ready {
        share_socket(&socket);
        debug!(socket = %socket.display(), "local socket shared");
    }
    ready
}

fn watch_parent(socket: &Path) -> notify::Result<(RecommendedWatcher, mpsc::Receiver<PathBuf>)> {
    let dir = socket.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let (tx, rx) = mpsc::channel(16);
    let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Create(_)) {
                for path in event.paths {
                    let _ = tx.blocking_send(path);
                }
            }
        }
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

async fn wait_for_create(
    socket: &Path,
    _watcher: RecommendedWatcher,
    mut created: mpsc::Receiver<PathBuf>,
    cancel: &CancellationToken,
) -> bool {
    // Checked after the watch is armed so a socket created in between is seen
    if socket.exists() {
        return true;
    }
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            path = created.recv() => match path {
                Some(path) if path.file_name() == socket.file_name() => return true,
                Some(_) => {}
                None => return poll_for(socket, cancel).await,
            },
        }
    }
}

async fn poll_for(socket: &Path, cancel: &CancellationToken) -> bool {
    while !socket.exists() {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(SOCKET_POLL_INTERVAL) => {}
        }
    }
    true
}

#[tonic::async_trait]
impl SocketStream for SocketProxyServer {
    type TransferDataStream = PacketStream;

    async fn transfer_data(
        &self,
        request: Request<Streaming<BytePacket>>,
    ) -> Result<Response<Self::TransferDataStream>, Status> {
        let local = UnixStream::connect(&self.socket).await.map_err(|e| {
            warn!(socket = %self.socket.display(), "failed to dial local socket: {}", e);
            Status::unavailable(format!("cannot reach {}: {}", self.socket.display(), e))
        })?;
        info!(socket = %self.socket.display(), "remote stream attached");

        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            if let Err(e) = splice(local, inbound, tx, cancel).await {
                debug!("remote stream closed: {}", e);
            }
        });

        let outbound: PacketStream = Box::pin(ReceiverStream::new(rx).map(Ok));
        Ok(Response::new(outbound))
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
