// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::AsyncReadExt;
use tokio::net::UnixListener;
use tonic::Code;

/// Accept one connection and return everything written to it.
fn listen_once(path: PathBuf) -> tokio::task::JoinHandle<serde_json::Value> {
    let listener = UnixListener::bind(path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        serde_json::from_slice(&buf).unwrap()
    })
}

fn notification(urgency: UrgencyLevel) -> UserNotification {
    UserNotification {
        event: "update".to_string(),
        title: "System update".to_string(),
        urgency: urgency as i32,
        icon: "software-update".to_string(),
        message: "Reboot to finish".to_string(),
    }
}

#[tokio::test]
async fn every_listener_receives_the_notification() {
    let dir = tempfile::tempdir().unwrap();
    let first = listen_once(dir.path().join("user-1000.sock"));
    let second = listen_once(dir.path().join("user-1001.sock"));
    std::fs::write(dir.path().join("README"), "not a socket").unwrap();

    let rpc = NotifierRpc::new(dir.path());
    let resp = rpc.notify_user(Request::new(notification(UrgencyLevel::Critical))).await.unwrap().into_inner();
    assert_eq!(resp.status, NOTIFICATION_SENT);

    for listener in [first, second] {
        let received = listener.await.unwrap();
        assert_eq!(received["event"], "update");
        assert_eq!(received["title"], "System update");
        assert_eq!(received["urgency"], "critical");
        assert_eq!(received["message"], "Reboot to finish");
    }
}

#[tokio::test]
async fn regular_files_are_not_listeners() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stale"), "").unwrap();
    assert!(NotifierRpc::new(dir.path()).sockets().unwrap().is_empty());
}

#[tokio::test]
async fn no_listeners_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let rpc = NotifierRpc::new(dir.path());
    let resp = rpc.notify_user(Request::new(notification(UrgencyLevel::Low))).await.unwrap().into_inner();
    assert_eq!(resp.status, NOTIFICATION_SENT);
}

#[tokio::test]
async fn dead_listener_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let live = listen_once(dir.path().join("a.sock"));
    // Bound then dropped: the socket file stays but nobody accepts
    drop(std::os::unix::net::UnixListener::bind(dir.path().join("b.sock")).unwrap());

    let rpc = NotifierRpc::new(dir.path());
    let req = notification(UrgencyLevel::Normal);
    let delivered = rpc.broadcast(&Notification::from_request(&req)).await.unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(live.await.unwrap()["urgency"], "normal");
}

#[tokio::test]
async fn missing_socket_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let rpc = NotifierRpc::new(dir.path().join("absent"));
    let err = rpc.notify_user(Request::new(notification(UrgencyLevel::Normal))).await.unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
}
