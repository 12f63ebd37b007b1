// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn claims() -> SecurityInfo {
    SecurityInfo {
        enabled: true,
        dns_names: vec!["net-vm".into()],
        ip_addrs: vec!["192.168.100.1".parse().unwrap(), "fd00::1".parse().unwrap()],
    }
}

#[yare::parameterized(
    v4_listed      = { "192.168.100.1", true },
    v4_mapped      = { "::ffff:192.168.100.1", true },
    v6_listed      = { "fd00::1", true },
    v4_unlisted    = { "192.168.100.2", false },
    loopback       = { "127.0.0.1", false },
)]
fn address_check(ip: &str, ok: bool) {
    assert_eq!(claims().check_address(ip.parse().unwrap()), ok);
}

#[yare::parameterized(
    v4    = { &[10, 0, 0, 1], Some("10.0.0.1") },
    v6    = { &[0xfd, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1], Some("fd00::1") },
    short = { &[1, 2, 3], None },
)]
fn ip_bytes(bytes: &[u8], expected: Option<&str>) {
    assert_eq!(ip_from_bytes(bytes), expected.map(|s| s.parse().unwrap()));
}

#[test]
fn garbage_certificate_rejected() {
    assert!(SecurityInfo::from_der(b"not a certificate").is_err());
}

#[test]
fn without_tls_requests_get_disabled_info() {
    let mut auth = AuthInterceptor::new(false);
    let req = auth.call(Request::new(())).unwrap();
    assert_eq!(req.extensions().get::<SecurityInfo>(), Some(&SecurityInfo::disabled()));
}

#[test]
fn with_tls_missing_connection_info_is_unauthenticated() {
    let mut auth = AuthInterceptor::new(true);
    let err = auth.call(Request::new(())).unwrap_err();
    assert_eq!(err.code(), tonic::Code::Unauthenticated);
}
