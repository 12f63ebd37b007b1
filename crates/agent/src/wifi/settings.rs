// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security classification and connection settings for access points.

use std::collections::BTreeMap;
use std::fmt;

use super::{AccessPoint, WifiError};

// NM 802.11 AP security flags (NM80211ApSecurityFlags)
pub const SEC_NONE: u32 = 0x0;
pub const SEC_KEY_MGMT_PSK: u32 = 0x100;
pub const SEC_KEY_MGMT_8021X: u32 = 0x200;
pub const SEC_KEY_MGMT_SAE: u32 = 0x400;
pub const SEC_KEY_MGMT_OWE: u32 = 0x800;
pub const SEC_KEY_MGMT_OWE_TM: u32 = 0x1000;

/// `802-11-wireless-security.key-mgmt` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMgmt {
    None,
    DynamicWep,
    Owe,
    WpaPsk,
    Sae,
    WpaEap,
}

impl KeyMgmt {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyMgmt::None => "none",
            KeyMgmt::DynamicWep => "ieee8021x",
            KeyMgmt::Owe => "owe",
            KeyMgmt::WpaPsk => "wpa-psk",
            KeyMgmt::Sae => "sae",
            KeyMgmt::WpaEap => "wpa-eap",
        }
    }

    /// Key management an access point requires; `None` when its flags fit
    /// no supported scheme.
    pub fn for_access_point(ap: &AccessPoint) -> Option<Self> {
        let (wpa, rsn) = (ap.wpa_flags, ap.rsn_flags);
        if (wpa | rsn) & SEC_KEY_MGMT_8021X != 0 {
            Some(KeyMgmt::WpaEap)
        } else if rsn & (SEC_KEY_MGMT_OWE | SEC_KEY_MGMT_OWE_TM) != 0 {
            Some(KeyMgmt::Owe)
        } else if rsn & SEC_KEY_MGMT_SAE != 0 {
            Some(KeyMgmt::Sae)
        } else if rsn & SEC_KEY_MGMT_PSK != 0 {
            Some(KeyMgmt::WpaPsk)
        } else if ap.privacy && wpa == SEC_NONE && rsn == SEC_NONE {
            Some(KeyMgmt::DynamicWep)
        } else if !ap.privacy {
            Some(KeyMgmt::None)
        } else {
            None
        }
    }
}

impl fmt::Display for KeyMgmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable security label, e.g. `WPA WPA2`.
///
/// APs advertising privacy together with both WPA and RSN flags are labelled
/// `None`, as NetworkManager clients historically show them.
pub fn security_label(ap: &AccessPoint) -> String {
    let (wpa, rsn) = (ap.wpa_flags, ap.rsn_flags);
    if ap.privacy && wpa != SEC_NONE && rsn != SEC_NONE {
        return "None".to_string();
    }
    let mut parts = Vec::new();
    if ap.privacy && wpa == SEC_NONE && rsn == SEC_NONE {
        parts.push("WEP");
    }
    if wpa != SEC_NONE {
        parts.push("WPA");
    }
    if rsn & (SEC_KEY_MGMT_PSK | SEC_KEY_MGMT_8021X) != 0 {
        parts.push("WPA2");
    }
    if rsn & SEC_KEY_MGMT_SAE != 0 {
        parts.push("WPA3");
    }
    if rsn & (SEC_KEY_MGMT_OWE | SEC_KEY_MGMT_OWE_TM) != 0 {
        parts.push("OWE");
    }
    if (wpa | rsn) & SEC_KEY_MGMT_8021X != 0 {
        parts.push("802.1X");
    }
    parts.join(" ")
}

/// A connection setting value, mapped onto a D-Bus variant by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    Bytes(Vec<u8>),
    StrList(Vec<String>),
}

impl TryFrom<&serde_json::Value> for SettingValue {
    type Error = WifiError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::String(s) => Ok(SettingValue::Str(s.clone())),
            Value::Bool(b) => Ok(SettingValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(SettingValue::Int)
                .or_else(|| n.as_f64().map(SettingValue::Double))
                .ok_or_else(|| WifiError::Settings(format!("unsupported number {}", n))),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(SettingValue::StrList)
                .ok_or_else(|| WifiError::Settings("arrays must contain only strings".to_string())),
            Value::Null | Value::Object(_) => Err(WifiError::Settings(format!("unsupported value {}", value))),
        }
    }
}

/// Setting group name to key/value pairs, as taken by `AddAndActivateConnection`.
pub type ConnectionSettings = BTreeMap<String, BTreeMap<String, SettingValue>>;

/// Infrastructure connection to `ssid` using `key_mgmt`.
pub fn base_settings(ssid: &str, password: &str, key_mgmt: KeyMgmt) -> ConnectionSettings {
    let group = |pairs: Vec<(&str, SettingValue)>| -> BTreeMap<String, SettingValue> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    };
    let mut settings = ConnectionSettings::new();
    settings.insert(
        "connection".to_string(),
        group(vec![
            ("id", SettingValue::Str(ssid.to_string())),
            ("type", SettingValue::Str("802-11-wireless".to_string())),
            ("autoconnect", SettingValue::Bool(true)),
        ]),
    );
    settings.insert(
        "802-11-wireless".to_string(),
        group(vec![
            ("ssid", SettingValue::Bytes(ssid.as_bytes().to_vec())),
            ("mode", SettingValue::Str("infrastructure".to_string())),
            ("security", SettingValue::Str("802-11-wireless-security".to_string())),
        ]),
    );
    settings.insert(
        "802-11-wireless-security".to_string(),
        group(vec![
            ("key-mgmt", SettingValue::Str(key_mgmt.as_str().to_string())),
            ("psk", SettingValue::Str(password.to_string())),
        ]),
    );
    settings
}

/// Merge a JSON object of setting groups into `settings`, overriding keys.
pub fn merge_settings(mut settings: ConnectionSettings, extra_json: &str) -> Result<ConnectionSettings, WifiError> {
    if extra_json.trim().is_empty() {
        return Ok(settings);
    }
    let extra: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(extra_json).map_err(|e| WifiError::Settings(e.to_string()))?;
    for (group, keys) in extra {
        let keys = keys
            .as_object()
            .ok_or_else(|| WifiError::Settings(format!("setting group {} is not an object", group)))?;
        let target = settings.entry(group).or_default();
        for (key, value) in keys {
            target.insert(key.clone(), SettingValue::try_from(value)?);
        }
    }
    Ok(settings)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
