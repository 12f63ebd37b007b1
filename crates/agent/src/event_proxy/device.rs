// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local input devices through evdev.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use evdev::{Device, EventStream, EventType};
use nix::errno::Errno;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{name_matches, DeviceFinder, DeviceIdentity, EventProxyError, InputSource, RawEvent, BATCH_SIZE};

pub const DEFAULT_INPUT_DIR: &str = "/dev/input";

/// Grace period for udev to finish setting up a new node.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Finds devices by watching an input directory for `event*` nodes.
pub struct EvdevFinder {
    dir: PathBuf,
}

impl Default for EvdevFinder {
    fn default() -> Self {
        Self { dir: PathBuf::from(DEFAULT_INPUT_DIR) }
    }
}

impl EvdevFinder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn try_open(path: &Path, target: &str) -> Option<Box<dyn InputSource>> {
        let device = match Device::open(path) {
            Ok(d) => d,
            Err(e) => {
                debug!(path = %path.display(), "cannot open input node: {}", e);
                return None;
            }
        };
        let name = device.name().unwrap_or_default().to_string();
        if !name_matches(&name, target) {
            return None;
        }
        let id = device.input_id();
        let identity = DeviceIdentity { vendor_id: id.vendor(), product_id: id.product(), name };
        match device.into_event_stream() {
            Ok(stream) => {
                info!(path = %path.display(), device = %identity.name, "input device attached");
                Some(Box::new(EvdevSource { identity, stream }))
            }
            Err(e) => {
                debug!(path = %path.display(), "cannot stream input node: {}", e);
                None
            }
        }
    }
}

/// `event*` nodes under `dir`, sorted.
pub fn event_nodes(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut nodes: Vec<PathBuf> =
        std::fs::read_dir(dir)?.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| is_event_node(p)).collect();
    nodes.sort();
    Ok(nodes)
}

pub fn is_event_node(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with("event"))
}

#[async_trait]
impl DeviceFinder for EvdevFinder {
    async fn find(&self, target: &str, cancel: &CancellationToken) -> Result<Box<dyn InputSource>, EventProxyError> {
        let (tx, mut rx) = mpsc::channel(32);
        let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                if matches!(event.kind, EventKind::Create(_)) {
                    for path in event.paths {
                        let _ = tx.blocking_send(path);
                    }
                }
            }
        })
        .map_err(|e| EventProxyError::Watch(e.to_string()))?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive).map_err(|e| EventProxyError::Watch(e.to_string()))?;

        // Scan after the watch is armed so a node created in between is not missed.
        for path in event_nodes(&self.dir)? {
            if let Some(source) = Self::try_open(&path, target) {
                return Ok(source);
            }
        }
        debug!(target, dir = %self.dir.display(), "waiting for input device");

        loop {
            let path = tokio::select! {
                _ = cancel.cancelled() => return Err(EventProxyError::Cancelled),
                path = rx.recv() => path.ok_or_else(|| EventProxyError::Watch("watcher stopped".to_string()))?,
            };
            if !is_event_node(&path) {
                continue;
            }
            tokio::time::sleep(SETTLE_DELAY).await;
            if let Some(source) = Self::try_open(&path, target) {
                return Ok(source);
            }
        }
    }
}

struct EvdevSource {
    identity: DeviceIdentity,
    stream: EventStream,
}

fn nanos(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH).map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)).unwrap_or(0)
}

#[async_trait]
impl InputSource for EvdevSource {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn read_batch(&mut self) -> Result<Vec<RawEvent>, EventProxyError> {
        let mut batch = Vec::with_capacity(BATCH_SIZE);
        while batch.len() < BATCH_SIZE {
            let event = match self.stream.next_event().await {
                Ok(ev) => ev,
                Err(e) if e.raw_os_error() == Some(Errno::ENODEV as i32) => {
                    return Err(EventProxyError::DeviceDisconnected)
                }
                Err(e) if batch.is_empty() => return Err(e.into()),
                Err(_) => break,
            };
            let event_type = event.event_type();
            batch.push(RawEvent {
                timestamp_ns: nanos(event.timestamp()),
                event_type: event_type.0,
                code: event.code(),
                value: event.value(),
            });
            if event_type == EventType::SYNCHRONIZATION {
                break;
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
