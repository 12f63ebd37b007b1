// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const SEC_PAIR_CCMP: u32 = 0x8;

fn ap(privacy: bool, wpa: u32, rsn: u32) -> AccessPoint {
    AccessPoint { ssid: "ghaf".into(), strength: 70, frequency: 5180, privacy, wpa_flags: wpa, rsn_flags: rsn }
}

#[parameterized(
    open = { false, 0, 0, Some(KeyMgmt::None) },
    wep = { true, 0, 0, Some(KeyMgmt::DynamicWep) },
    wpa2_psk = { true, 0, SEC_KEY_MGMT_PSK | SEC_PAIR_CCMP, Some(KeyMgmt::WpaPsk) },
    wpa3 = { true, 0, SEC_KEY_MGMT_SAE, Some(KeyMgmt::Sae) },
    transition = { true, 0, SEC_KEY_MGMT_SAE | SEC_KEY_MGMT_PSK, Some(KeyMgmt::Sae) },
    owe = { false, 0, SEC_KEY_MGMT_OWE, Some(KeyMgmt::Owe) },
    owe_tm = { false, 0, SEC_KEY_MGMT_OWE_TM, Some(KeyMgmt::Owe) },
    enterprise_rsn = { true, 0, SEC_KEY_MGMT_8021X, Some(KeyMgmt::WpaEap) },
    enterprise_wpa = { true, SEC_KEY_MGMT_8021X, 0, Some(KeyMgmt::WpaEap) },
    wpa1_psk_only = { true, SEC_KEY_MGMT_PSK, 0, None },
)]
fn key_mgmt_selection(privacy: bool, wpa: u32, rsn: u32, expected: Option<KeyMgmt>) {
    assert_eq!(KeyMgmt::for_access_point(&ap(privacy, wpa, rsn)), expected);
}

#[parameterized(
    open = { false, 0, 0, "" },
    wep = { true, 0, 0, "WEP" },
    wpa2 = { true, 0, SEC_KEY_MGMT_PSK, "WPA2" },
    wpa3 = { true, 0, SEC_KEY_MGMT_SAE, "WPA3" },
    owe = { false, 0, SEC_KEY_MGMT_OWE, "OWE" },
    enterprise = { true, 0, SEC_KEY_MGMT_8021X, "WPA2 802.1X" },
    wpa1 = { false, SEC_KEY_MGMT_PSK, 0, "WPA" },
    mixed_with_privacy = { true, SEC_KEY_MGMT_PSK, SEC_KEY_MGMT_PSK, "None" },
)]
fn security_labels(privacy: bool, wpa: u32, rsn: u32, expected: &str) {
    assert_eq!(security_label(&ap(privacy, wpa, rsn)), expected);
}

#[test]
fn base_settings_carry_ssid_bytes_and_key_mgmt() {
    let settings = base_settings("ghaf", "secret", KeyMgmt::WpaPsk);
    assert_eq!(settings["802-11-wireless"]["ssid"], SettingValue::Bytes(b"ghaf".to_vec()));
    assert_eq!(settings["802-11-wireless-security"]["key-mgmt"], SettingValue::Str("wpa-psk".into()));
    assert_eq!(settings["802-11-wireless-security"]["psk"], SettingValue::Str("secret".into()));
    assert_eq!(settings["connection"]["autoconnect"], SettingValue::Bool(true));
}

#[test]
fn merge_adds_groups_and_overrides_keys() {
    let extra = r#"{
        "802-1x": { "eap": ["peap"], "identity": "user", "phase2-auth": "mschapv2" },
        "802-11-wireless-security": { "psk": "override" },
        "ipv4": { "route-metric": 600 }
    }"#;
    let settings = merge_settings(base_settings("corp", "pw", KeyMgmt::WpaEap), extra).unwrap();
    assert_eq!(settings["802-1x"]["eap"], SettingValue::StrList(vec!["peap".into()]));
    assert_eq!(settings["802-1x"]["identity"], SettingValue::Str("user".into()));
    assert_eq!(settings["802-11-wireless-security"]["psk"], SettingValue::Str("override".into()));
    assert_eq!(settings["802-11-wireless-security"]["key-mgmt"], SettingValue::Str("wpa-eap".into()));
    assert_eq!(settings["ipv4"]["route-metric"], SettingValue::Int(600));
}

#[test]
fn empty_extra_settings_are_a_no_op() {
    let base = base_settings("corp", "pw", KeyMgmt::WpaEap);
    assert_eq!(merge_settings(base.clone(), "  ").unwrap(), base);
}

#[parameterized(
    not_json = { "{eap" },
    not_object = { "[1]" },
    group_not_object = { r#"{"802-1x": "peap"}"# },
    nested_object = { r#"{"802-1x": {"eap": {"x": 1}}}"# },
    mixed_array = { r#"{"802-1x": {"eap": ["peap", 1]}}"# },
    null_value = { r#"{"802-1x": {"eap": null}}"# },
)]
fn malformed_extra_settings(extra: &str) {
    let err = merge_settings(ConnectionSettings::new(), extra).unwrap_err();
    assert!(matches!(err, WifiError::Settings(_)));
}
