// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request sanitization for application launches.
//!
//! Every runtime argument must satisfy one of the argument kinds declared by
//! the application's manifest. Kinds are tried in the order flag, url, file;
//! the first kind that is both declared and matched accepts the argument.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::manifest::{ApplicationManifest, ArgType};
use crate::naming::parse_instance_name;

/// Custom URL schemes that are checked as if they were `http`.
pub const DEFAULT_EXTRA_URL_SCHEMES: [&str; 2] = ["element", "io.element.desktop"];

#[allow(clippy::expect_used)]
static SERVICE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+@[a-zA-Z0-9_-]+\.service$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static FLAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[-]?[a-zA-Z0-9_-]+$").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[-a-zA-Z0-9_/.()\[\]{} ]+$").expect("constant regex pattern is valid")
});

/// Characters with meaning to a shell; never allowed in a URL argument.
const SHELL_METACHARACTERS: &[char] = &['$', '`', ';', '|', '&', '<', '>', '\'', '"', '\\'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid service name: {0}")]
    InvalidServiceName(String),
    #[error("application not found in manifest: {0}")]
    UnknownApplication(String),
    #[error("invalid application argument: {0}")]
    InvalidArgument(String),
}

/// Validates launch requests against a fixed set of manifests.
#[derive(Debug, Clone, Default)]
pub struct ArgumentValidator {
    manifests: Vec<ApplicationManifest>,
    extra_url_schemes: Vec<String>,
}

impl ArgumentValidator {
    pub fn new(manifests: Vec<ApplicationManifest>) -> Self {
        Self {
            manifests,
            extra_url_schemes: DEFAULT_EXTRA_URL_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_url_schemes<S: Into<String>>(mut self, schemes: impl IntoIterator<Item = S>) -> Self {
        self.extra_url_schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    pub fn manifests(&self) -> &[ApplicationManifest] {
        &self.manifests
    }

    pub fn manifest(&self, name: &str) -> Option<&ApplicationManifest> {
        self.manifests.iter().find(|m| m.name == name)
    }

    /// Check `<base>@<id>.service` and return the manifest for `<base>`.
    pub fn validate_service_name(&self, service_name: &str) -> Result<&ApplicationManifest, ValidationError> {
        if !is_printable_ascii(service_name) || !SERVICE_NAME_PATTERN.is_match(service_name) {
            return Err(ValidationError::InvalidServiceName(service_name.to_string()));
        }
        let (base, _) = parse_instance_name(service_name)
            .ok_or_else(|| ValidationError::InvalidServiceName(service_name.to_string()))?;
        self.manifest(base).ok_or_else(|| ValidationError::UnknownApplication(base.to_string()))
    }

    /// Validate a full launch request.
    pub fn validate_app_unit_request(
        &self,
        service_name: &str,
        args: &[String],
    ) -> Result<&ApplicationManifest, ValidationError> {
        let manifest = self.validate_service_name(service_name)?;
        for arg in args {
            self.validate_arg(manifest, arg)?;
        }
        Ok(manifest)
    }

    /// First declared argument kind that accepts `arg`.
    pub fn classify(&self, manifest: &ApplicationManifest, arg: &str) -> Option<ArgType> {
        ArgType::VALIDATION_ORDER.into_iter().find(|ty| {
            manifest.accepts(*ty)
                && match ty {
                    ArgType::Flag => validate_flag(arg),
                    ArgType::Url => validate_url(arg, &self.extra_url_schemes),
                    ArgType::File => validate_file(arg, &manifest.directories),
                }
        })
    }

    fn validate_arg(&self, manifest: &ApplicationManifest, arg: &str) -> Result<(), ValidationError> {
        match self.classify(manifest, arg) {
            Some(_) => Ok(()),
            None => Err(ValidationError::InvalidArgument(arg.to_string())),
        }
    }
}

pub fn validate_flag(arg: &str) -> bool {
    is_printable_ascii(arg) && FLAG_PATTERN.is_match(arg)
}

/// Absolute http(s) URL without credentials or shell metacharacters.
pub fn validate_url<S: AsRef<str>>(arg: &str, extra_schemes: &[S]) -> bool {
    if !is_printable_ascii(arg) || arg.contains(char::is_whitespace) || arg.contains(SHELL_METACHARACTERS) {
        return false;
    }
    let candidate = rewrite_extra_scheme(arg, extra_schemes);
    let Ok(url) = Url::parse(&candidate) else {
        return false;
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    if !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    url.host_str().is_some_and(|h| !h.is_empty())
}

fn rewrite_extra_scheme<S: AsRef<str>>(arg: &str, extra_schemes: &[S]) -> String {
    for scheme in extra_schemes {
        if let Some(rest) = arg.strip_prefix(scheme.as_ref()).and_then(|r| r.strip_prefix(':')) {
            return format!("http://{}", rest.trim_start_matches('/'));
        }
    }
    arg.to_string()
}

/// Clean absolute path below one of `directories` that exists on disk.
pub fn validate_file<S: AsRef<str>>(arg: &str, directories: &[S]) -> bool {
    if !FILE_PATTERN.is_match(arg) || arg.contains("../") {
        return false;
    }
    if clean_path(arg) != arg {
        return false;
    }
    let path = Path::new(arg);
    let allowed = directories.iter().any(|dir| {
        let dir = dir.as_ref();
        dir.starts_with('/') && path.starts_with(dir)
    });
    allowed && path.exists()
}

/// Lexical path normalization: collapses separators, drops `.` and resolves `..`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            p => parts.push(p),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn is_printable_ascii(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| (0x20..0x7f).contains(&b))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
