// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locale and timezone values accepted from clients.
//!
//! Both end up on a command line (`localectl`, `timedatectl`), so anything
//! outside the strict grammar below is rejected.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[allow(clippy::expect_used)]
static LOCALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:C|POSIX|[a-z]{2}(?:_[A-Z]{2})?(?:@[a-zA-Z0-9]+)?)(?:\.[-a-zA-Z0-9]+)?$")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static TIMEZONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][-+a-zA-Z0-9]*(?:/[A-Z][-+a-zA-Z0-9_]*)*$")
        .expect("constant regex pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("invalid locale: {0}")]
    InvalidLocale(String),
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("unknown locale key: {0}")]
    UnknownKey(String),
}

pub fn validate_locale(locale: &str) -> Result<(), LocaleError> {
    if LOCALE_PATTERN.is_match(locale) {
        Ok(())
    } else {
        Err(LocaleError::InvalidLocale(locale.to_string()))
    }
}

pub fn validate_timezone(timezone: &str) -> Result<(), LocaleError> {
    if TIMEZONE_PATTERN.is_match(timezone) {
        Ok(())
    } else {
        Err(LocaleError::InvalidTimezone(timezone.to_string()))
    }
}

/// Locale environment categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocaleKey {
    Lang,
    Language,
    LcCtype,
    LcNumeric,
    LcTime,
    LcCollate,
    LcMonetary,
    LcMessages,
    LcPaper,
    LcName,
    LcAddress,
    LcTelephone,
    LcMeasurement,
    LcIdentification,
    LcAll,
}

impl LocaleKey {
    pub const ALL: [LocaleKey; 15] = [
        LocaleKey::Lang,
        LocaleKey::Language,
        LocaleKey::LcCtype,
        LocaleKey::LcNumeric,
        LocaleKey::LcTime,
        LocaleKey::LcCollate,
        LocaleKey::LcMonetary,
        LocaleKey::LcMessages,
        LocaleKey::LcPaper,
        LocaleKey::LcName,
        LocaleKey::LcAddress,
        LocaleKey::LcTelephone,
        LocaleKey::LcMeasurement,
        LocaleKey::LcIdentification,
        LocaleKey::LcAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LocaleKey::Lang => "LANG",
            LocaleKey::Language => "LANGUAGE",
            LocaleKey::LcCtype => "LC_CTYPE",
            LocaleKey::LcNumeric => "LC_NUMERIC",
            LocaleKey::LcTime => "LC_TIME",
            LocaleKey::LcCollate => "LC_COLLATE",
            LocaleKey::LcMonetary => "LC_MONETARY",
            LocaleKey::LcMessages => "LC_MESSAGES",
            LocaleKey::LcPaper => "LC_PAPER",
            LocaleKey::LcName => "LC_NAME",
            LocaleKey::LcAddress => "LC_ADDRESS",
            LocaleKey::LcTelephone => "LC_TELEPHONE",
            LocaleKey::LcMeasurement => "LC_MEASUREMENT",
            LocaleKey::LcIdentification => "LC_IDENTIFICATION",
            LocaleKey::LcAll => "LC_ALL",
        }
    }
}

impl fmt::Display for LocaleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocaleKey {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| LocaleError::UnknownKey(s.to_string()))
    }
}

/// One `KEY=value` locale setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleAssignment {
    pub key: LocaleKey,
    pub value: String,
}

impl LocaleAssignment {
    pub fn new(key: LocaleKey, value: impl Into<String>) -> Self {
        Self { key, value: value.into() }
    }

    pub fn validate(&self) -> Result<(), LocaleError> {
        validate_locale(&self.value)
    }
}

impl fmt::Display for LocaleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for LocaleAssignment {
    type Err = LocaleError;

    /// Parse `KEY=value`; a bare value means `LANG=value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let assignment = match s.split_once('=') {
            Some((key, value)) => Self::new(key.parse()?, value),
            None => Self::new(LocaleKey::Lang, s),
        };
        assignment.validate()?;
        Ok(assignment)
    }
}

#[cfg(test)]
#[path = "locale_tests.rs"]
mod tests;
