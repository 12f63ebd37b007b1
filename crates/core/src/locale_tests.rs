// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    utf8        = { "en_US.UTF-8" },
    c           = { "C" },
    posix       = { "POSIX" },
    c_utf8      = { "C.UTF-8" },
    arabic      = { "ar_AE.UTF-8" },
    modifier    = { "fi_FI@euro.UTF-8" },
    no_codeset  = { "fi_FI@euro" },
)]
fn valid_locales(locale: &str) {
    assert_eq!(validate_locale(locale), Ok(()));
}

#[yare::parameterized(
    backticks = { "`rm -Rf --no-preserve-root /`" },
    semicolon = { "; whoami" },
    garbage   = { "iwaenfli" },
    empty     = { "" },
)]
fn invalid_locales(locale: &str) {
    assert!(validate_locale(locale).is_err());
}

#[yare::parameterized(
    utc        = { "UTC" },
    helsinki   = { "Europe/Helsinki" },
    abu_dhabi  = { "Asia/Abu_Dhabi" },
    etc_offset = { "Etc/GMT+8" },
    gmt_minus  = { "GMT-0" },
    nested     = { "America/Argentina/Rio_Gallegos" },
)]
fn valid_timezones(tz: &str) {
    assert_eq!(validate_timezone(tz), Ok(()));
}

#[yare::parameterized(
    leading_slash = { "/foobar" },
    backticks     = { "`whoami`" },
    double_slash  = { "Almost//Valid" },
)]
fn invalid_timezones(tz: &str) {
    assert!(validate_timezone(tz).is_err());
}

#[test]
fn assignment_parsing() {
    let a: LocaleAssignment = "LC_TIME=fi_FI.UTF-8".parse().unwrap();
    assert_eq!(a, LocaleAssignment::new(LocaleKey::LcTime, "fi_FI.UTF-8"));
    assert_eq!(a.to_string(), "LC_TIME=fi_FI.UTF-8");

    let bare: LocaleAssignment = "en_US.UTF-8".parse().unwrap();
    assert_eq!(bare.key, LocaleKey::Lang);

    assert_eq!("LC_FOO=C".parse::<LocaleAssignment>(), Err(LocaleError::UnknownKey("LC_FOO".into())));
    assert!("LANG=$(id)".parse::<LocaleAssignment>().is_err());
}

#[test]
fn keys_roundtrip_through_names() {
    for key in LocaleKey::ALL {
        assert_eq!(key.as_str().parse::<LocaleKey>().unwrap(), key);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.as_str()));
    }
}
