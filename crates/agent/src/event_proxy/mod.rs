// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input-device bridge between VMs.
//!
//! A producer finds a named local input device and streams its events to a
//! consumer, which drives a virtual device of the matching class. Device
//! access sits behind [`DeviceFinder`]/[`InputSource`] and
//! [`VirtualDeviceFactory`]/[`VirtualDevice`] so both ends run against fakes
//! in tests.

pub mod consumer;
pub mod device;
pub mod producer;
pub mod virtual_device;

pub use consumer::EventConsumer;
pub use device::EvdevFinder;
pub use producer::EventProducer;
pub use virtual_device::UinputFactory;

use std::time::Duration;

use async_trait::async_trait;
use givc_wire::pb::event::{DeviceInfo, InputEvent};
use givc_wire::WireError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Maximum events forwarded per read.
pub const BATCH_SIZE: usize = 16;

/// How long a producer keeps dialing an absent consumer.
pub const CONSUMER_DIAL_TIMEOUT: Duration = Duration::from_secs(60);

pub const DIAL_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Devices whose name contains this are never forwarded, so a virtual
/// device created by a consumer is not picked up again by a producer.
pub const LOOP_GUARD_NAME: &str = "vmmouse";

pub const ACK_OK: &str = "OK";
pub const ACK_STREAM_ERROR: &str = "Stream Error";

#[derive(Debug, Error)]
pub enum EventProxyError {
    #[error("input device disconnected")]
    DeviceDisconnected,
    #[error("unsupported device: {0}")]
    UnsupportedDevice(String),
    #[error("device watch failed: {0}")]
    Watch(String),
    #[error("virtual device: {0}")]
    Virtual(String),
    #[error("consumer unreachable: {0}")]
    ConsumerUnreachable(Status),
    #[error("event stream closed")]
    StreamClosed,
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Identity read from an input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
}

impl From<&DeviceIdentity> for DeviceInfo {
    fn from(id: &DeviceIdentity) -> Self {
        DeviceInfo { vendor_id: id.vendor_id.into(), device_id: id.product_id.into(), name: id.name.clone() }
    }
}

/// One kernel input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub timestamp_ns: i64,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl From<RawEvent> for InputEvent {
    fn from(ev: RawEvent) -> Self {
        InputEvent { timestamp: ev.timestamp_ns, r#type: ev.event_type.into(), code: ev.code.into(), value: ev.value }
    }
}

impl TryFrom<&InputEvent> for RawEvent {
    type Error = EventProxyError;

    fn try_from(ev: &InputEvent) -> Result<Self, Self::Error> {
        let narrow = |v: u32, what: &str| {
            u16::try_from(v).map_err(|_| EventProxyError::Virtual(format!("{} {} out of range", what, v)))
        };
        Ok(RawEvent {
            timestamp_ns: ev.timestamp,
            event_type: narrow(ev.r#type, "event type")?,
            code: narrow(ev.code, "event code")?,
            value: ev.value,
        })
    }
}

/// Virtual device classes a consumer can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Gamepad,
    Mouse,
}

impl DeviceClass {
    /// Class for a device named `name`, by case-insensitive substring.
    pub fn classify(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("wireless controller") {
            Some(DeviceClass::Gamepad)
        } else if name.contains("mouse") {
            Some(DeviceClass::Mouse)
        } else {
            None
        }
    }
}

/// True when a device called `name` should be forwarded for `target`.
pub fn name_matches(name: &str, target: &str) -> bool {
    let name = name.to_lowercase();
    !name.contains(LOOP_GUARD_NAME) && name.contains(&target.to_lowercase())
}

/// An opened input device.
#[async_trait]
pub trait InputSource: Send {
    fn identity(&self) -> &DeviceIdentity;

    /// Next batch of at most [`BATCH_SIZE`] events. A vanished device
    /// yields [`EventProxyError::DeviceDisconnected`].
    async fn read_batch(&mut self) -> Result<Vec<RawEvent>, EventProxyError>;
}

#[async_trait]
pub trait DeviceFinder: Send + Sync {
    /// Wait until a device matching `target` exists and open it.
    async fn find(&self, target: &str, cancel: &CancellationToken) -> Result<Box<dyn InputSource>, EventProxyError>;
}

/// A registered virtual device. Dropping it unregisters it.
pub trait VirtualDevice: Send {
    fn emit(&mut self, events: &[RawEvent]) -> Result<(), EventProxyError>;
}

pub trait VirtualDeviceFactory: Send + Sync {
    fn create(&self, class: DeviceClass, identity: &DeviceIdentity) -> Result<Box<dyn VirtualDevice>, EventProxyError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
