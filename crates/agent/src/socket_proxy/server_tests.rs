// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::socket_proxy::SocketProxyClient;
use givc_core::TransportConfig;
use givc_wire::pb::socket::socket_stream_client::SocketStreamClient;
use givc_wire::EndpointConfig;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tonic::service::RoutesBuilder;

/// Local service that echoes every connection back to itself.
fn spawn_echo(path: &Path) {
    let listener = UnixListener::bind(path).unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut r, mut w) = stream.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });
}

async fn spawn_proxy_server(dir: &Path, local: &Path, cancel: &CancellationToken) -> TransportConfig {
    let transport = TransportConfig::unix("proxy", dir.join("grpc.sock").display().to_string());
    let listener = givc_wire::server::bind_with_retry(&transport, 1, Duration::from_millis(1)).await.unwrap();
    let mut routes = RoutesBuilder::default();
    routes.add_service(SocketProxyServer::new(local, cancel.clone()).into_server(false));
    tokio::spawn(givc_wire::serve(listener, routes.routes(), None, cancel.clone()));
    transport
}

async fn wait_for(path: &Path) {
    for _ in 0..200 {
        if path.exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never appeared", path.display());
}

#[tokio::test]
async fn client_and_server_bridge_local_sockets() {
    let dir = tempfile::tempdir().unwrap();
    let echo = dir.path().join("echo.sock");
    spawn_echo(&echo);
    let cancel = CancellationToken::new();
    let transport = spawn_proxy_server(dir.path(), &echo, &cancel).await;

    let front = dir.path().join("front.sock");
    let client = SocketProxyClient::new(&front, EndpointConfig::new(transport, None));
    tokio::spawn(client.run(cancel.clone()));
    wait_for(&front).await;

    let mut app = UnixStream::connect(&front).await.unwrap();
    app.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    app.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");

    app.write_all(b"second").await.unwrap();
    let mut buf = [0u8; 6];
    app.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"second");

    cancel.cancel();
}

#[tokio::test]
async fn missing_local_socket_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let transport = spawn_proxy_server(dir.path(), &dir.path().join("absent.sock"), &cancel).await;

    let channel = EndpointConfig::new(transport, None).connect().unwrap();
    let (_tx, rx) = mpsc::channel::<BytePacket>(1);
    let err = SocketStreamClient::new(channel).transfer_data(ReceiverStream::new(rx)).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::Unavailable);
    cancel.cancel();
}

#[tokio::test]
async fn share_when_ready_wakes_on_socket_creation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.sock");
    let task = tokio::spawn(share_when_ready(path.clone(), CancellationToken::new()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    std::fs::write(dir.path().join("unrelated"), "").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());

    let _listener = UnixListener::bind(&path).unwrap();
    // Well under the polling fallback's interval
    let shared = tokio::time::timeout(SOCKET_POLL_INTERVAL / 2, task).await.unwrap().unwrap();
    assert!(shared);
    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, crate::socket_proxy::SOCKET_MODE);
}

#[tokio::test]
async fn share_when_ready_sees_existing_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("early.sock");
    let _listener = UnixListener::bind(&path).unwrap();
    assert!(share_when_ready(path, CancellationToken::new()).await);
}

#[tokio::test(start_paused = true)]
async fn share_when_ready_polls_when_directory_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("later").join("app.sock");
    let task = tokio::spawn(share_when_ready(path.clone(), CancellationToken::new()));

    tokio::time::sleep(SOCKET_POLL_INTERVAL * 3).await;
    assert!(!task.is_finished());

    std::fs::create_dir(dir.path().join("later")).unwrap();
    let _listener = UnixListener::bind(&path).unwrap();
    assert!(task.await.unwrap());
}

#[tokio::test]
async fn share_when_ready_stops_on_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(!share_when_ready(dir.path().join("never.sock"), cancel).await);
}
