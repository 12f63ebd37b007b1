// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wireless network management.
//!
//! The RPC surface in [`service`] drives a [`WifiBackend`]; the production
//! backend is NetworkManager over the system bus.

pub mod network_manager;
pub mod service;
pub mod settings;

pub use service::WifiRpc;
pub use settings::{ConnectionSettings, KeyMgmt, SettingValue};

use async_trait::async_trait;
use thiserror::Error;
use tonic::Status;

#[derive(Debug, Error)]
pub enum WifiError {
    #[error(transparent)]
    Bus(#[from] zbus::Error),
    #[error("no wireless device available")]
    NoDevice,
    #[error("network {0} not found")]
    UnknownNetwork(String),
    #[error("invalid connection settings: {0}")]
    Settings(String),
    #[error("connection to {ssid} failed: {reason}")]
    Activation { ssid: String, reason: String },
    #[error("timed out connecting to {0}")]
    Timeout(String),
}

impl From<WifiError> for Status {
    fn from(err: WifiError) -> Self {
        match err {
            WifiError::NoDevice => Status::failed_precondition(err.to_string()),
            WifiError::UnknownNetwork(_) => Status::not_found(err.to_string()),
            WifiError::Settings(_) => Status::invalid_argument(err.to_string()),
            WifiError::Timeout(_) => Status::deadline_exceeded(err.to_string()),
            WifiError::Bus(_) | WifiError::Activation { .. } => Status::unknown(err.to_string()),
        }
    }
}

/// One access point as seen by the wireless device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPoint {
    pub ssid: String,
    /// Signal quality in percent
    pub strength: u32,
    /// MHz
    pub frequency: u32,
    /// The AP requires encryption
    pub privacy: bool,
    pub wpa_flags: u32,
    pub rsn_flags: u32,
}

/// Access to a wireless stack.
#[async_trait]
pub trait WifiBackend: Send + Sync {
    async fn access_points(&self) -> Result<Vec<AccessPoint>, WifiError>;

    /// The access point the device is associated with, if any.
    async fn active_access_point(&self) -> Result<Option<AccessPoint>, WifiError>;

    /// Add a connection with `settings` and wait until it is activated.
    async fn connect(&self, ssid: &str, settings: ConnectionSettings) -> Result<(), WifiError>;

    /// Disconnect every wireless device; returns their interface names.
    async fn disconnect(&self) -> Result<Vec<String>, WifiError>;

    async fn set_wireless_enabled(&self, enabled: bool) -> Result<(), WifiError>;
}
