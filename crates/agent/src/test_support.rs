// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles for the agent's external seams.

#![allow(clippy::panic)]

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use givc_core::RegistryEntry;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tonic::Status;

use crate::config::AgentConfig;
use crate::event_proxy::{
    DeviceClass, DeviceFinder, DeviceIdentity, EventProxyError, InputSource, RawEvent, VirtualDevice,
    VirtualDeviceFactory,
};
use crate::lifecycle::Backends;
use crate::locale::{CommandError, CommandRunner};
use crate::register::Registrar;
use crate::wifi::{AccessPoint, ConnectionSettings, WifiBackend, WifiError};

pub use crate::init::fake::FakeInit;

/// System-VM agent config named `net-vm` managing `services`.
pub fn sysvm_config(services: &[&str]) -> AgentConfig {
    let json = serde_json::json!({
        "identity": { "type": 8, "subType": 9, "name": "net-vm" },
        "network": {
            "adminEndpoint": { "name": "admin-vm", "addr": "192.168.100.3", "port": "9001", "protocol": "tcp" },
            "agentEndpoint": { "name": "net-vm", "addr": "192.168.100.1", "port": "9000", "protocol": "tcp" }
        },
        "capabilities": { "services": services }
    });
    match AgentConfig::from_json(&json.to_string()) {
        Ok(config) => config,
        Err(e) => panic!("fixture config rejected: {}", e),
    }
}

/// Agent `name` serving on `<dir>/<name>.sock`, with `capabilities` as
/// given in the JSON configuration.
pub fn unix_agent_config(dir: &Path, name: &str, capabilities: serde_json::Value) -> AgentConfig {
    let socket = dir.join(format!("{}.sock", name));
    let json = serde_json::json!({
        "identity": { "type": 12, "subType": 14, "name": name },
        "network": {
            "adminEndpoint": { "name": "admin-vm", "addr": dir.join("admin.sock").display().to_string(), "protocol": "unix" },
            "agentEndpoint": { "name": name, "addr": socket.display().to_string(), "protocol": "unix" }
        },
        "capabilities": capabilities
    });
    match AgentConfig::from_json(&json.to_string()) {
        Ok(config) => config,
        Err(e) => panic!("fixture config rejected: {}", e),
    }
}

/// Fake backends plus handles for inspecting them.
pub struct FakeBackends {
    pub init: Arc<FakeInit>,
    pub registrar: Arc<FakeRegistrar>,
    pub commands: Arc<RecordingCommands>,
    pub wifi: Option<Arc<FakeWifi>>,
    pub devices: Arc<FakeDeviceFinder>,
    pub virtual_devices: FakeVirtualDeviceFactory,
}

impl FakeBackends {
    pub fn new(init: FakeInit) -> Self {
        Self {
            init: Arc::new(init),
            registrar: Arc::new(FakeRegistrar::default()),
            commands: Arc::new(RecordingCommands::default()),
            wifi: None,
            devices: Arc::new(FakeDeviceFinder::default()),
            virtual_devices: FakeVirtualDeviceFactory::default(),
        }
    }

    pub fn with_wifi(mut self, wifi: FakeWifi) -> Self {
        self.wifi = Some(Arc::new(wifi));
        self
    }

    pub fn backends(&self) -> Backends {
        Backends {
            init: self.init.clone(),
            registrar: self.registrar.clone(),
            commands: self.commands.clone(),
            wifi: self.wifi.clone().map(|w| w as Arc<dyn WifiBackend>),
            devices: self.devices.clone(),
            virtual_devices: Arc::new(self.virtual_devices.clone()),
            proc: crate::units::resources::ProcFs::default(),
            sys_net: None,
        }
    }
}

/// Admin double that records registrations.
#[derive(Default)]
pub struct FakeRegistrar {
    accepted: Mutex<Vec<RegistryEntry>>,
    attempts: AtomicU32,
    failures: AtomicU32,
    rejected: Mutex<HashSet<String>>,
}

impl FakeRegistrar {
    /// Accepted entries in order.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.accepted.lock().clone()
    }

    /// Every call, accepted or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Answer the next `n` calls with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Always refuse `name`.
    pub fn reject(&self, name: &str) {
        self.rejected.lock().insert(name.to_string());
    }
}

#[async_trait]
impl Registrar for FakeRegistrar {
    async fn register(&self, entry: RegistryEntry) -> Result<(), Status> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(Status::unavailable("admin not ready"));
        }
        if self.rejected.lock().contains(&entry.name) {
            return Err(Status::unknown(format!("{} refused", entry.name)));
        }
        self.accepted.lock().push(entry);
        Ok(())
    }
}

/// Records commands as `"program arg…"` instead of running them.
#[derive(Default)]
pub struct RecordingCommands {
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingCommands {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommandRunner for RecordingCommands {
    async fn run(&self, program: &str, args: &[String]) -> Result<(), CommandError> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().push(line);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        Ok(())
    }
}

/// Wireless stack with a fixed scan list on interface `wlp0s5f0`.
pub struct FakeWifi {
    access_points: Vec<AccessPoint>,
    active: Mutex<Option<AccessPoint>>,
    connections: Mutex<Vec<(String, ConnectionSettings)>>,
    enabled: AtomicBool,
}

impl FakeWifi {
    pub fn new(access_points: Vec<AccessPoint>) -> Self {
        Self {
            access_points,
            active: Mutex::new(None),
            connections: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_active(&self, ap: Option<AccessPoint>) {
        *self.active.lock() = ap;
    }

    pub fn connections(&self) -> Vec<(String, ConnectionSettings)> {
        self.connections.lock().clone()
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WifiBackend for FakeWifi {
    async fn access_points(&self) -> Result<Vec<AccessPoint>, WifiError> {
        Ok(self.access_points.clone())
    }

    async fn active_access_point(&self) -> Result<Option<AccessPoint>, WifiError> {
        Ok(self.active.lock().clone())
    }

    async fn connect(&self, ssid: &str, settings: ConnectionSettings) -> Result<(), WifiError> {
        self.connections.lock().push((ssid.to_string(), settings));
        let ap = self.access_points.iter().find(|ap| ap.ssid == ssid).cloned();
        *self.active.lock() = ap;
        Ok(())
    }

    async fn disconnect(&self) -> Result<Vec<String>, WifiError> {
        *self.active.lock() = None;
        Ok(vec!["wlp0s5f0".to_string()])
    }

    async fn set_wireless_enabled(&self, enabled: bool) -> Result<(), WifiError> {
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted input device. Once the script runs out, reads block forever.
pub struct FakeSource {
    identity: DeviceIdentity,
    script: VecDeque<Result<Vec<RawEvent>, EventProxyError>>,
}

impl FakeSource {
    pub fn new(name: &str, vendor_id: u16, product_id: u16) -> Self {
        Self { identity: DeviceIdentity { vendor_id, product_id, name: name.to_string() }, script: VecDeque::new() }
    }

    pub fn with_batch(mut self, events: Vec<RawEvent>) -> Self {
        self.script.push_back(Ok(events));
        self
    }

    pub fn then_disconnect(mut self) -> Self {
        self.script.push_back(Err(EventProxyError::DeviceDisconnected));
        self
    }
}

#[async_trait]
impl InputSource for FakeSource {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn read_batch(&mut self) -> Result<Vec<RawEvent>, EventProxyError> {
        match self.script.pop_front() {
            Some(step) => step,
            None => std::future::pending().await,
        }
    }
}

/// Hands out queued sources in order; waits for cancellation when empty.
#[derive(Default)]
pub struct FakeDeviceFinder {
    sources: Mutex<VecDeque<FakeSource>>,
    finds: AtomicUsize,
}

impl FakeDeviceFinder {
    pub fn push(&self, source: FakeSource) {
        self.sources.lock().push_back(source);
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceFinder for FakeDeviceFinder {
    async fn find(&self, _target: &str, cancel: &CancellationToken) -> Result<Box<dyn InputSource>, EventProxyError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        let next = self.sources.lock().pop_front();
        match next {
            Some(source) => Ok(Box::new(source)),
            None => {
                cancel.cancelled().await;
                Err(EventProxyError::Cancelled)
            }
        }
    }
}

/// Records created devices and the events they receive.
#[derive(Default, Clone)]
pub struct FakeVirtualDeviceFactory {
    created: Arc<Mutex<Vec<(DeviceClass, DeviceIdentity)>>>,
    emitted: Arc<Mutex<Vec<RawEvent>>>,
    live: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl FakeVirtualDeviceFactory {
    pub fn created(&self) -> Vec<(DeviceClass, DeviceIdentity)> {
        self.created.lock().clone()
    }

    pub fn emitted(&self) -> Vec<RawEvent> {
        self.emitted.lock().clone()
    }

    /// Devices created and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl VirtualDeviceFactory for FakeVirtualDeviceFactory {
    fn create(&self, class: DeviceClass, identity: &DeviceIdentity) -> Result<Box<dyn VirtualDevice>, EventProxyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EventProxyError::Virtual("uinput unavailable".to_string()));
        }
        self.created.lock().push((class, identity.clone()));
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeVirtualDevice { emitted: self.emitted.clone(), live: self.live.clone() }))
    }
}

struct FakeVirtualDevice {
    emitted: Arc<Mutex<Vec<RawEvent>>>,
    live: Arc<AtomicUsize>,
}

impl VirtualDevice for FakeVirtualDevice {
    fn emit(&mut self, events: &[RawEvent]) -> Result<(), EventProxyError> {
        self.emitted.lock().extend_from_slice(events);
        Ok(())
    }
}

impl Drop for FakeVirtualDevice {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
