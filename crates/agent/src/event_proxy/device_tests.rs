// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    event_node = { "/dev/input/event3", true },
    mouse_node = { "/dev/input/mouse0", false },
    by_id_dir = { "/dev/input/by-id", false },
    bare_event = { "event", true },
)]
fn event_node_names(path: &str, expected: bool) {
    assert_eq!(is_event_node(Path::new(path)), expected);
}

#[test]
fn event_nodes_are_listed_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["event2", "mice", "event0", "js0", "event10"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    let names: Vec<String> = event_nodes(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["event0", "event10", "event2"]);
}

#[test]
fn timestamps_in_nanoseconds() {
    let at = UNIX_EPOCH + Duration::new(3, 250);
    assert_eq!(nanos(at), 3_000_000_250);
    assert_eq!(nanos(UNIX_EPOCH), 0);
}

#[tokio::test]
async fn find_stops_on_cancel_when_nothing_matches() {
    let dir = tempfile::tempdir().unwrap();
    // Regular files are not input devices, so nothing opens.
    std::fs::write(dir.path().join("event0"), b"").unwrap();

    let finder = EvdevFinder::new(dir.path());
    let cancel = CancellationToken::new();
    let child = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        child.cancel();
    });
    assert!(matches!(finder.find("controller", &cancel).await, Err(EventProxyError::Cancelled)));
}

#[tokio::test]
async fn find_fails_for_missing_directory() {
    let finder = EvdevFinder::new("/nonexistent/input");
    let result = finder.find("mouse", &CancellationToken::new()).await;
    assert!(matches!(result, Err(EventProxyError::Watch(_))));
}
