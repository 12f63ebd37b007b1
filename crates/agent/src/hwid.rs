// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `HwidService`: the MAC address of a network interface as hardware id.

use std::path::{Path, PathBuf};

use givc_wire::pb::hwid::hwid_service_server::{HwidService, HwidServiceServer};
use givc_wire::pb::hwid::{HwIdRequest, HwIdResponse};
use givc_wire::AuthInterceptor;
use thiserror::Error;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{debug, warn};

pub const DEFAULT_SYS_NET: &str = "/sys/class/net";

/// `IFF_RUNNING` from `<linux/if.h>`.
const IFF_RUNNING: u32 = 0x40;

/// Interface name prefixes tried in order when none is configured.
const INTERFACE_PREFIXES: [&str; 2] = ["wl", "en"];

#[derive(Debug, Error)]
pub enum HwidError {
    #[error("no wireless or ethernet interface found")]
    NoInterface,
    #[error("interface {0} is not running")]
    NotRunning(String),
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("malformed flags for interface {0}")]
    Flags(String),
}

impl From<HwidError> for Status {
    fn from(err: HwidError) -> Self {
        match err {
            HwidError::NoInterface => Status::not_found(err.to_string()),
            HwidError::NotRunning(_) => Status::failed_precondition(err.to_string()),
            HwidError::Read { .. } | HwidError::Flags(_) => Status::internal(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HwidRpc {
    sys_net: PathBuf,
    interface: Option<String>,
}

impl HwidRpc {
    /// An empty `interface` selects one automatically on each request.
    pub fn new(interface: &str) -> Self {
        Self { sys_net: PathBuf::from(DEFAULT_SYS_NET), interface: Some(interface.to_string()).filter(|i| !i.is_empty()) }
    }

    pub fn with_sys_net(mut self, root: impl Into<PathBuf>) -> Self {
        self.sys_net = root.into();
        self
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<HwidServiceServer<Self>, AuthInterceptor> {
        HwidServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }

    fn interface(&self) -> Result<String, HwidError> {
        if let Some(iface) = &self.interface {
            return Ok(iface.clone());
        }
        let read_dir = std::fs::read_dir(&self.sys_net)
            .map_err(|source| HwidError::Read { path: self.sys_net.clone(), source })?;
        let mut names: Vec<String> =
            read_dir.filter_map(|e| e.ok()).filter_map(|e| e.file_name().into_string().ok()).collect();
        names.sort();
        INTERFACE_PREFIXES
            .iter()
            .find_map(|prefix| names.iter().find(|n| n.starts_with(prefix)))
            .cloned()
            .ok_or(HwidError::NoInterface)
    }

    pub fn identifier(&self) -> Result<String, HwidError> {
        let iface = self.interface()?;
        let dir = self.sys_net.join(&iface);
        let flags = read_trimmed(&dir.join("flags"))?;
        let flags = u32::from_str_radix(flags.trim_start_matches("0x"), 16).map_err(|_| HwidError::Flags(iface.clone()))?;
        if flags & IFF_RUNNING == 0 {
            return Err(HwidError::NotRunning(iface));
        }
        let address = read_trimmed(&dir.join("address"))?;
        debug!(interface = %iface, "resolved hardware identifier");
        Ok(address)
    }
}

fn read_trimmed(path: &Path) -> Result<String, HwidError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| HwidError::Read { path: path.to_path_buf(), source })
}

#[tonic::async_trait]
impl HwidService for HwidRpc {
    async fn get_hw_id(&self, _request: Request<HwIdRequest>) -> Result<Response<HwIdResponse>, Status> {
        let identifier = self.identifier().map_err(|e| {
            warn!("hardware id unavailable: {}", e);
            Status::from(e)
        })?;
        Ok(Response::new(HwIdResponse { identifier }))
    }
}

#[cfg(test)]
#[path = "hwid_tests.rs"]
mod tests;
