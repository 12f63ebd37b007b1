// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn json_accepts_string_and_numeric_ports() {
    let a: TransportConfig =
        serde_json::from_str(r#"{"name":"admin-vm","addr":"192.168.100.3","port":"9001","protocol":"tcp"}"#)
            .unwrap();
    let b: TransportConfig =
        serde_json::from_str(r#"{"name":"admin-vm","address":"192.168.100.3","port":9001,"protocol":"tcp"}"#)
            .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.endpoint().unwrap(), EndpointAddress::Tcp { host: "192.168.100.3".into(), port: 9001 });
}

#[test]
fn json_serializes_with_addr_key() {
    let t = TransportConfig::new("net-vm", "10.0.0.2", "9000", Protocol::Tcp);
    let value = serde_json::to_value(&t).unwrap();
    assert_eq!(value["addr"], "10.0.0.2");
    assert_eq!(value["protocol"], "tcp");
}

#[yare::parameterized(
    numeric = { "3", 3 },
    host    = { "host", VSOCK_CID_HOST },
    local   = { "local", VSOCK_CID_LOCAL },
)]
fn vsock_cids(addr: &str, cid: u32) {
    let t = TransportConfig::new("x", addr, "9000", Protocol::Vsock);
    assert_eq!(t.endpoint().unwrap(), EndpointAddress::Vsock { cid, port: 9000 });
}

#[test]
fn vsock_dial_target_format() {
    let t = TransportConfig::new("x", "3", "9000", Protocol::Vsock);
    assert_eq!(t.endpoint().unwrap().to_string(), "passthrough:vsock:3:9000");
}

#[yare::parameterized(
    empty_address = { TransportConfig::new("x", "", "9000", Protocol::Tcp), TransportError::MissingAddress },
    bad_port      = { TransportConfig::new("x", "h", "nope", Protocol::Tcp), TransportError::InvalidPort("nope".into()) },
    bad_cid       = { TransportConfig::new("x", "cid", "1", Protocol::Vsock), TransportError::InvalidCid("cid".into()) },
)]
fn endpoint_errors(t: TransportConfig, err: TransportError) {
    assert_eq!(t.endpoint().unwrap_err(), err);
}

#[yare::parameterized(
    tcp   = { "0.0.0.0:9000", Protocol::Tcp, "0.0.0.0", "9000" },
    ipv6  = { "[::1]:9000", Protocol::Tcp, "::1", "9000" },
    unix  = { "unix:/run/givc/admin.sock", Protocol::Unix, "/run/givc/admin.sock", "" },
    vsock = { "vsock:any:9000", Protocol::Vsock, "any", "9000" },
)]
fn parse_listen(spec: &str, protocol: Protocol, address: &str, port: &str) {
    let t = TransportConfig::parse_listen("admin-vm", spec).unwrap();
    assert_eq!(t.protocol, protocol);
    assert_eq!(t.address, address);
    assert_eq!(t.port, port);
    assert_eq!(t.name, "admin-vm");
}

#[yare::parameterized(
    no_port    = { "localhost" },
    empty_unix = { "unix:" },
    bad_vsock  = { "vsock:3" },
)]
fn parse_listen_rejects(spec: &str) {
    assert!(TransportConfig::parse_listen("x", spec).is_err());
}

#[test]
fn unknown_protocol() {
    assert!(serde_json::from_str::<TransportConfig>(r#"{"protocol":"udp"}"#).is_err());
    assert_eq!("udp".parse::<Protocol>(), Err(TransportError::UnknownProtocol("udp".into())));
}
