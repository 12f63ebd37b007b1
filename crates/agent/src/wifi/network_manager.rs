// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NetworkManager backend.
//!
//! Wireless devices are looked up on every call, so devices added after
//! startup are picked up without a signal handler.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use zbus::proxy;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};
use zbus::Connection;

use super::settings::{ConnectionSettings, SettingValue};
use super::{AccessPoint, WifiBackend, WifiError};

const NM_DEVICE_TYPE_WIFI: u32 = 2;

/// NMActiveConnectionState
const STATE_UNKNOWN: u32 = 0;
const STATE_ACTIVATING: u32 = 1;
const STATE_ACTIVATED: u32 = 2;

/// Upper bound on waiting for a new connection to activate.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
trait NetworkManager {
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn add_and_activate_connection(
        &self,
        connection: HashMap<&str, HashMap<&str, Value<'_>>>,
        device: &ObjectPath<'_>,
        specific_object: &ObjectPath<'_>,
    ) -> zbus::Result<(OwnedObjectPath, OwnedObjectPath)>;

    #[zbus(property)]
    fn wireless_enabled(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn set_wireless_enabled(&self, enabled: bool) -> zbus::Result<()>;
}

#[proxy(interface = "org.freedesktop.NetworkManager.Device", default_service = "org.freedesktop.NetworkManager")]
trait Device {
    fn disconnect(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn managed(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn device_type(&self) -> zbus::Result<u32>;

    #[zbus(property)]
    fn interface(&self) -> zbus::Result<String>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.Device.Wireless",
    default_service = "org.freedesktop.NetworkManager"
)]
trait Wireless {
    fn get_all_access_points(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    #[zbus(property)]
    fn active_access_point(&self) -> zbus::Result<OwnedObjectPath>;
}

#[proxy(interface = "org.freedesktop.NetworkManager.AccessPoint", default_service = "org.freedesktop.NetworkManager")]
trait AccessPointObject {
    #[zbus(property)]
    fn ssid(&self) -> zbus::Result<Vec<u8>>;

    #[zbus(property)]
    fn strength(&self) -> zbus::Result<u8>;

    #[zbus(property)]
    fn frequency(&self) -> zbus::Result<u32>;

    #[zbus(property)]
    fn flags(&self) -> zbus::Result<u32>;

    #[zbus(property)]
    fn wpa_flags(&self) -> zbus::Result<u32>;

    #[zbus(property)]
    fn rsn_flags(&self) -> zbus::Result<u32>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.Connection.Active",
    default_service = "org.freedesktop.NetworkManager"
)]
trait ActiveConnection {
    #[zbus(signal)]
    fn state_changed(&self, state: u32, reason: u32) -> zbus::Result<()>;
}

fn to_variant(value: &SettingValue) -> Value<'_> {
    match value {
        SettingValue::Str(s) => Value::from(s.as_str()),
        SettingValue::Bool(b) => Value::from(*b),
        SettingValue::Int(i) => Value::from(*i),
        SettingValue::Double(d) => Value::from(*d),
        SettingValue::Bytes(bytes) => Value::from(bytes.clone()),
        SettingValue::StrList(items) => Value::from(items.clone()),
    }
}

pub struct NetworkManagerWifi {
    conn: Connection,
    nm: NetworkManagerProxy<'static>,
    connect_timeout: Duration,
}

impl NetworkManagerWifi {
    pub async fn connect() -> Result<Self, WifiError> {
        let conn = Connection::system().await?;
        let nm = NetworkManagerProxy::new(&conn).await?;
        info!("connected to NetworkManager");
        Ok(Self { conn, nm, connect_timeout: CONNECT_TIMEOUT })
    }

    /// Managed wireless devices.
    async fn wifi_devices(&self) -> Result<Vec<OwnedObjectPath>, WifiError> {
        let mut out = Vec::new();
        for path in self.nm.get_devices().await? {
            let device = DeviceProxy::builder(&self.conn).path(path.clone())?.build().await?;
            if !device.managed().await? {
                continue;
            }
            if device.device_type().await? == NM_DEVICE_TYPE_WIFI {
                out.push(path);
            }
        }
        Ok(out)
    }

    async fn wireless(&self, path: &OwnedObjectPath) -> Result<WirelessProxy<'static>, WifiError> {
        Ok(WirelessProxy::builder(&self.conn).path(path.clone())?.build().await?)
    }

    async fn access_point(&self, path: OwnedObjectPath) -> Result<AccessPoint, WifiError> {
        let ap = AccessPointObjectProxy::builder(&self.conn).path(path)?.build().await?;
        Ok(AccessPoint {
            ssid: String::from_utf8_lossy(&ap.ssid().await?).into_owned(),
            strength: u32::from(ap.strength().await?),
            frequency: ap.frequency().await?,
            privacy: ap.flags().await? != 0,
            wpa_flags: ap.wpa_flags().await?,
            rsn_flags: ap.rsn_flags().await?,
        })
    }

    async fn wait_activated(&self, ssid: &str, active: OwnedObjectPath) -> Result<(), WifiError> {
        let proxy = ActiveConnectionProxy::builder(&self.conn).path(active)?.build().await?;
        let mut changes = proxy.receive_state_changed().await?;
        let wait = async {
            while let Some(signal) = changes.next().await {
                let state = *signal.args()?.state();
                match state {
                    STATE_ACTIVATING => debug!(ssid, "connecting"),
                    STATE_ACTIVATED => return Ok(()),
                    STATE_UNKNOWN => {
                        return Err(WifiError::Activation { ssid: ssid.to_string(), reason: "state unknown".into() })
                    }
                    other => {
                        return Err(WifiError::Activation {
                            ssid: ssid.to_string(),
                            reason: format!("unexpected state {}", other),
                        })
                    }
                }
            }
            Err(WifiError::Activation { ssid: ssid.to_string(), reason: "signal stream closed".into() })
        };
        tokio::time::timeout(self.connect_timeout, wait).await.map_err(|_| WifiError::Timeout(ssid.to_string()))?
    }
}

#[async_trait]
impl WifiBackend for NetworkManagerWifi {
    async fn access_points(&self) -> Result<Vec<AccessPoint>, WifiError> {
        let mut out = Vec::new();
        for device in self.wifi_devices().await? {
            for path in self.wireless(&device).await?.get_all_access_points().await? {
                out.push(self.access_point(path).await?);
            }
        }
        Ok(out)
    }

    async fn active_access_point(&self) -> Result<Option<AccessPoint>, WifiError> {
        for device in self.wifi_devices().await? {
            let path = self.wireless(&device).await?.active_access_point().await?;
            if path.as_str() != "/" {
                return self.access_point(path).await.map(Some);
            }
        }
        Ok(None)
    }

    async fn connect(&self, ssid: &str, settings: ConnectionSettings) -> Result<(), WifiError> {
        let device = self.wifi_devices().await?.into_iter().next().ok_or(WifiError::NoDevice)?;
        let connection: HashMap<&str, HashMap<&str, Value<'_>>> = settings
            .iter()
            .map(|(group, keys)| (group.as_str(), keys.iter().map(|(k, v)| (k.as_str(), to_variant(v))).collect()))
            .collect();
        let root = ObjectPath::from_static_str_unchecked("/");
        let (_, active) = self.nm.add_and_activate_connection(connection, &device, &root).await?;
        debug!(ssid, active = %active, "connection added");
        self.wait_activated(ssid, active).await
    }

    async fn disconnect(&self) -> Result<Vec<String>, WifiError> {
        let mut interfaces = Vec::new();
        for path in self.wifi_devices().await? {
            let device = DeviceProxy::builder(&self.conn).path(path)?.build().await?;
            device.disconnect().await?;
            match device.interface().await {
                Ok(name) => interfaces.push(name),
                Err(e) => warn!("cannot read interface name: {}", e),
            }
        }
        Ok(interfaces)
    }

    async fn set_wireless_enabled(&self, enabled: bool) -> Result<(), WifiError> {
        self.nm.set_wireless_enabled(enabled).await?;
        Ok(())
    }
}
