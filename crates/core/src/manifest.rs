// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application manifests: which applications an agent may launch and which
//! runtime argument kinds each one accepts.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of runtime argument an application accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    Flag,
    Url,
    File,
}

impl ArgType {
    /// Order in which argument kinds are tried during validation.
    pub const VALIDATION_ORDER: [ArgType; 3] = [ArgType::Flag, ArgType::Url, ArgType::File];
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArgType::Flag => "flag",
            ArgType::Url => "url",
            ArgType::File => "file",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationManifest {
    #[serde(alias = "Name")]
    pub name: String,
    /// argv0 plus fixed arguments, split on whitespace at launch
    #[serde(alias = "Command")]
    pub command: String,
    #[serde(default, alias = "Args", skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgType>,
    /// Absolute directory prefixes allowed for `file` arguments
    #[serde(default, alias = "Directories", skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<String>,
}

impl ApplicationManifest {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self { name: name.into(), command: command.into(), ..Default::default() }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = ArgType>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    pub fn with_directories<S: Into<String>>(mut self, dirs: impl IntoIterator<Item = S>) -> Self {
        self.directories = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn accepts(&self, ty: ArgType) -> bool {
        self.args.contains(&ty)
    }

    /// The command split into argv.
    pub fn argv(&self) -> Vec<String> {
        self.command.split_whitespace().map(str::to_string).collect()
    }

    fn check(&self) -> Result<(), ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::EmptyName);
        }
        if self.command.trim().is_empty() {
            return Err(ManifestError::EmptyCommand(self.name.clone()));
        }
        let wants_files = self.accepts(ArgType::File);
        if wants_files && self.directories.is_empty() {
            return Err(ManifestError::FileArgWithoutDirectories(self.name.clone()));
        }
        if !wants_files && !self.directories.is_empty() {
            return Err(ManifestError::DirectoriesWithoutFileArg(self.name.clone()));
        }
        if let Some(dir) = self.directories.iter().find(|d| !d.starts_with('/')) {
            return Err(ManifestError::RelativeDirectory(self.name.clone(), dir.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("application name is empty")]
    EmptyName,
    #[error("duplicate application name: {0}")]
    DuplicateName(String),
    #[error("application command is empty: {0}")]
    EmptyCommand(String),
    #[error("file argument given but no directories specified: {0}")]
    FileArgWithoutDirectories(String),
    #[error("directories specified but file argument type missing: {0}")]
    DirectoriesWithoutFileArg(String),
    #[error("directory of {0} is not absolute: {1}")]
    RelativeDirectory(String, String),
    #[error("invalid application manifest JSON: {0}")]
    Json(String),
}

/// Check every manifest and the uniqueness of their names.
pub fn validate_application_manifests(manifests: &[ApplicationManifest]) -> Result<(), ManifestError> {
    let mut seen = HashSet::new();
    for manifest in manifests {
        manifest.check()?;
        if !seen.insert(manifest.name.as_str()) {
            return Err(ManifestError::DuplicateName(manifest.name.clone()));
        }
    }
    Ok(())
}

/// Parse and validate a JSON array of manifests.
pub fn parse_application_manifests(json: &str) -> Result<Vec<ApplicationManifest>, ManifestError> {
    let manifests: Vec<ApplicationManifest> =
        serde_json::from_str(json).map_err(|e| ManifestError::Json(e.to_string()))?;
    validate_application_manifests(&manifests)?;
    Ok(manifests)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
