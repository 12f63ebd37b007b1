// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WifiService` RPC surface.

use std::sync::Arc;

use givc_wire::pb::wifi::wifi_service_server::{WifiService, WifiServiceServer};
use givc_wire::pb::wifi::{
    AccessPoint as PbAccessPoint, AccessPointList, ActiveConnection, EmptyRequest, NetworkRequest, WifiResponse,
};
use givc_wire::AuthInterceptor;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use super::settings::{base_settings, merge_settings, security_label, KeyMgmt};
use super::{AccessPoint, WifiBackend, WifiError};

type RpcResult<T> = Result<Response<T>, Status>;

#[derive(Clone)]
pub struct WifiRpc {
    backend: Arc<dyn WifiBackend>,
}

impl WifiRpc {
    pub fn new(backend: Arc<dyn WifiBackend>) -> Self {
        Self { backend }
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<WifiServiceServer<Self>, AuthInterceptor> {
        WifiServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }

    async fn connect(&self, req: NetworkRequest) -> Result<String, WifiError> {
        let aps = self.backend.access_points().await?;
        let ap = aps.iter().find(|ap| ap.ssid == req.ssid).ok_or_else(|| WifiError::UnknownNetwork(req.ssid.clone()))?;
        let key_mgmt = KeyMgmt::for_access_point(ap)
            .ok_or_else(|| WifiError::Settings(format!("unsupported security on {}", req.ssid)))?;

        let mut settings = base_settings(&req.ssid, &req.password, key_mgmt);
        if key_mgmt == KeyMgmt::WpaEap {
            settings = merge_settings(settings, &req.extra_settings_json)?;
        }
        info!(ssid = %req.ssid, %key_mgmt, "connecting");
        self.backend.connect(&req.ssid, settings).await?;
        Ok(format!("Connected to {} successfully", req.ssid))
    }
}

fn to_pb(ap: &AccessPoint) -> PbAccessPoint {
    PbAccessPoint {
        ssid: ap.ssid.clone(),
        signal_strength: ap.strength,
        frequency: ap.frequency,
        security: security_label(ap),
    }
}

fn failed(op: &str, err: WifiError) -> Status {
    warn!(op, "{}", err);
    err.into()
}

#[tonic::async_trait]
impl WifiService for WifiRpc {
    async fn list_network(&self, _request: Request<EmptyRequest>) -> RpcResult<AccessPointList> {
        let aps = self.backend.access_points().await.map_err(|e| failed("list", e))?;
        Ok(Response::new(AccessPointList { networks: aps.iter().map(to_pb).collect() }))
    }

    async fn get_active_connection(&self, _request: Request<EmptyRequest>) -> RpcResult<ActiveConnection> {
        let active = self.backend.active_access_point().await.map_err(|e| failed("active", e))?;
        Ok(Response::new(match active {
            Some(ap) => ActiveConnection {
                connected: true,
                ssid: ap.ssid.clone(),
                signal_strength: ap.strength,
                security: security_label(&ap),
            },
            None => ActiveConnection::default(),
        }))
    }

    async fn connect_network(&self, request: Request<NetworkRequest>) -> RpcResult<WifiResponse> {
        let status = self.connect(request.into_inner()).await.map_err(|e| failed("connect", e))?;
        Ok(Response::new(WifiResponse { status }))
    }

    async fn disconnect_network(&self, _request: Request<EmptyRequest>) -> RpcResult<WifiResponse> {
        let interfaces = self.backend.disconnect().await.map_err(|e| failed("disconnect", e))?;
        let status = match interfaces.last() {
            Some(iface) => format!("{} disconnected successfully", iface),
            None => "wifi disconnection failed".to_string(),
        };
        Ok(Response::new(WifiResponse { status }))
    }

    async fn turn_on(&self, _request: Request<EmptyRequest>) -> RpcResult<WifiResponse> {
        self.backend.set_wireless_enabled(true).await.map_err(|e| failed("turn on", e))?;
        Ok(Response::new(WifiResponse { status: "Wireless enabled successfully".to_string() }))
    }

    async fn turn_off(&self, _request: Request<EmptyRequest>) -> RpcResult<WifiResponse> {
        self.backend.set_wireless_enabled(false).await.map_err(|e| failed("turn off", e))?;
        Ok(Response::new(WifiResponse { status: "Wireless disabled successfully".to_string() }))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
