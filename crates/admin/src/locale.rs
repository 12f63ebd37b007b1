// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet-wide locale and timezone, remembered in memory and on disk.
//!
//! Disk writes are best effort: a read-only `/etc` must not fail the RPC.

use std::path::{Path, PathBuf};

use givc_core::{validate_timezone, LocaleAssignment};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::AdminError;

pub const DEFAULT_LOCALE_FILE: &str = "/etc/locale-givc.conf";
pub const DEFAULT_TIMEZONE_FILE: &str = "/etc/timezone.conf";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    pub assignments: Vec<LocaleAssignment>,
    pub timezone: String,
}

#[derive(Debug)]
pub struct LocaleStore {
    locale_file: PathBuf,
    timezone_file: PathBuf,
    current: Mutex<LocaleSettings>,
}

impl LocaleStore {
    /// Load previously persisted settings; unreadable or malformed lines are skipped.
    pub fn load(locale_file: impl Into<PathBuf>, timezone_file: impl Into<PathBuf>) -> Self {
        let locale_file = locale_file.into();
        let timezone_file = timezone_file.into();
        let assignments = read_locale_file(&locale_file);
        let timezone = std::fs::read_to_string(&timezone_file)
            .ok()
            .and_then(|s| s.lines().next().map(|l| l.trim().to_string()))
            .filter(|tz| validate_timezone(tz).is_ok())
            .unwrap_or_default();
        debug!(assignments = assignments.len(), %timezone, "loaded locale settings");
        Self { locale_file, timezone_file, current: Mutex::new(LocaleSettings { assignments, timezone }) }
    }

    pub fn current(&self) -> LocaleSettings {
        self.current.lock().clone()
    }

    pub async fn set_locale(&self, assignments: Vec<LocaleAssignment>) -> Result<(), AdminError> {
        if assignments.is_empty() {
            return Err(AdminError::Validation("no locale assignments provided".into()));
        }
        for a in &assignments {
            a.validate()?;
        }
        let content = assignments.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
        persist(&self.locale_file, content).await;
        self.current.lock().assignments = assignments;
        Ok(())
    }

    pub async fn set_timezone(&self, timezone: &str) -> Result<(), AdminError> {
        validate_timezone(timezone)?;
        persist(&self.timezone_file, timezone.to_string()).await;
        self.current.lock().timezone = timezone.to_string();
        Ok(())
    }
}

fn read_locale_file(path: &Path) -> Vec<LocaleAssignment> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| l.contains('='))
        .filter_map(|l| match l.trim().parse::<LocaleAssignment>() {
            Ok(a) => Some(a),
            Err(e) => {
                warn!(path = %path.display(), line = l, "ignoring locale line: {}", e);
                None
            }
        })
        .collect()
}

async fn persist(path: &Path, content: String) {
    if let Err(e) = tokio::fs::write(path, content).await {
        warn!(path = %path.display(), "failed to persist setting: {}", e);
    }
}

#[cfg(test)]
#[path = "locale_tests.rs"]
mod tests;
