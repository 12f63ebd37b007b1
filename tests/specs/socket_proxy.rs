// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A Unix socket in one VM reachable from another through two agents.

use crate::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

struct Bridge {
    service: UnixListener,
    front: PathBuf,
    server: Agent,
    client: Agent,
    _dir: tempfile::TempDir,
}

/// `audio-vm` owns `service.sock`; `gui-vm` exposes it as `front.sock`.
async fn bridge() -> Bridge {
    let dir = tempfile::tempdir().unwrap();
    let service_path = dir.path().join("service.sock");
    let grpc = dir.path().join("proxy-grpc.sock").display().to_string();
    let front = dir.path().join("front.sock");
    let service = UnixListener::bind(&service_path).unwrap();

    let server_config = unix_agent_config(
        dir.path(),
        "audio-vm",
        json!({ "socketProxy": { "sockets": [{
            "transport": { "name": "gui-vm", "addr": grpc, "protocol": "unix" },
            "server": true,
            "socket": service_path,
        }] } }),
    );
    let server = Agent::start(server_config, FakeBackends::new(FakeInit::default())).await;

    let client_config = unix_agent_config(
        dir.path(),
        "gui-vm",
        json!({ "socketProxy": { "sockets": [{
            "transport": { "name": "audio-vm", "addr": grpc, "protocol": "unix" },
            "server": false,
            "socket": front,
        }] } }),
    );
    let client = Agent::start(client_config, FakeBackends::new(FakeInit::default())).await;
    wait_for_path(&front).await;

    Bridge { service, front, server, client, _dir: dir }
}

async fn read_n(stream: &mut UnixStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    tokio::time::timeout(SPEC_WAIT_MAX, stream.read_exact(&mut buf)).await.unwrap().unwrap();
    buf
}

#[tokio::test]
async fn bytes_cross_in_both_directions() {
    let bridge = bridge().await;

    let mut app = UnixStream::connect(&bridge.front).await.unwrap();
    app.write_all(b"hello\n").await.unwrap();
    let (mut backend, _) = tokio::time::timeout(SPEC_WAIT_MAX, bridge.service.accept()).await.unwrap().unwrap();
    assert_eq!(read_n(&mut backend, 6).await, b"hello\n");

    backend.write_all(b"world").await.unwrap();
    assert_eq!(read_n(&mut app, 5).await, b"world");

    bridge.client.stop().await;
    bridge.server.stop().await;
}

#[tokio::test]
async fn closing_the_client_closes_the_backend() {
    let bridge = bridge().await;

    let mut app = UnixStream::connect(&bridge.front).await.unwrap();
    app.write_all(b"bye").await.unwrap();
    let (mut backend, _) = tokio::time::timeout(SPEC_WAIT_MAX, bridge.service.accept()).await.unwrap().unwrap();
    assert_eq!(read_n(&mut backend, 3).await, b"bye");

    drop(app);
    let mut rest = Vec::new();
    let n = tokio::time::timeout(SPEC_WAIT_MAX, backend.read_to_end(&mut rest)).await.unwrap().unwrap();
    assert_eq!(n, 0, "backend saw end of stream, not data");

    bridge.client.stop().await;
    bridge.server.stop().await;
}

#[tokio::test]
async fn concurrent_connections_stay_separate() {
    let bridge = bridge().await;

    let mut first = UnixStream::connect(&bridge.front).await.unwrap();
    first.write_all(b"first").await.unwrap();
    let (mut backend_a, _) = tokio::time::timeout(SPEC_WAIT_MAX, bridge.service.accept()).await.unwrap().unwrap();

    let mut second = UnixStream::connect(&bridge.front).await.unwrap();
    second.write_all(b"second").await.unwrap();
    let (mut backend_b, _) = tokio::time::timeout(SPEC_WAIT_MAX, bridge.service.accept()).await.unwrap().unwrap();

    assert_eq!(read_n(&mut backend_a, 5).await, b"first");
    assert_eq!(read_n(&mut backend_b, 6).await, b"second");

    backend_b.write_all(b"to-second").await.unwrap();
    backend_a.write_all(b"to-first").await.unwrap();
    assert_eq!(read_n(&mut first, 8).await, b"to-first");
    assert_eq!(read_n(&mut second, 9).await, b"to-second");

    bridge.client.stop().await;
    bridge.server.stop().await;
}
