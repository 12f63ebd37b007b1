// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `UnitControlService` RPC surface.

use std::sync::Arc;
use std::time::Duration;

use givc_core::UnitStatus;
use givc_wire::pb::systemd::unit_control_service_server::{UnitControlService, UnitControlServiceServer};
use givc_wire::pb::systemd::{AppUnitRequest, UnitRequest, UnitResourceRequest, UnitResourceResponse, UnitResponse};
use givc_wire::AuthInterceptor;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use super::resources::ProcFs;
use super::{Launcher, UnitController, UnitError};

/// Number of samples a `MonitorUnit` stream emits before closing.
pub const MONITOR_SAMPLES: usize = 50;

pub const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

type RpcResult<T> = Result<Response<T>, Status>;

#[derive(Clone)]
pub struct UnitRpc {
    controller: Arc<UnitController>,
    launcher: Arc<Launcher>,
    proc: ProcFs,
    shutdown: CancellationToken,
}

impl UnitRpc {
    pub fn new(controller: Arc<UnitController>, launcher: Arc<Launcher>, shutdown: CancellationToken) -> Self {
        Self { controller, launcher, proc: ProcFs::default(), shutdown }
    }

    pub fn with_proc(mut self, proc: ProcFs) -> Self {
        self.proc = proc;
        self
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<UnitControlServiceServer<Self>, AuthInterceptor> {
        UnitControlServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }

    async fn respond(&self, name: &str) -> RpcResult<UnitResponse> {
        let status = self.controller.get_unit_status(name).await?;
        Ok(unit_response(status))
    }
}

fn unit_response(status: UnitStatus) -> Response<UnitResponse> {
    Response::new(status.into())
}

fn log_failure(op: &str, name: &str, err: UnitError) -> Status {
    warn!(op, unit = name, "{}", err);
    err.into()
}

#[tonic::async_trait]
impl UnitControlService for UnitRpc {
    async fn start_application(&self, request: Request<AppUnitRequest>) -> RpcResult<UnitResponse> {
        let req = request.into_inner();
        info!(unit = %req.unit_name, args = req.args.len(), "start application request");
        let status = self.launcher.start_application(&req.unit_name, &req.args).await.map_err(|e| {
            warn!(unit = %req.unit_name, "application start failed: {}", e);
            Status::from(e)
        })?;
        Ok(unit_response(status))
    }

    async fn start_unit(&self, request: Request<UnitRequest>) -> RpcResult<UnitResponse> {
        let name = request.into_inner().unit_name;
        self.controller.start_unit(&name).await.map_err(|e| log_failure("start", &name, e))?;
        self.respond(&name).await
    }

    async fn stop_unit(&self, request: Request<UnitRequest>) -> RpcResult<UnitResponse> {
        let name = request.into_inner().unit_name;
        self.controller.stop_unit(&name).await.map_err(|e| log_failure("stop", &name, e))?;
        self.respond(&name).await
    }

    async fn kill_unit(&self, request: Request<UnitRequest>) -> RpcResult<UnitResponse> {
        let name = request.into_inner().unit_name;
        self.controller.kill_unit(&name).await.map_err(|e| log_failure("kill", &name, e))?;
        self.respond(&name).await
    }

    async fn freeze_unit(&self, request: Request<UnitRequest>) -> RpcResult<UnitResponse> {
        let name = request.into_inner().unit_name;
        self.controller.freeze_unit(&name).await.map_err(|e| log_failure("freeze", &name, e))?;
        self.respond(&name).await
    }

    async fn unfreeze_unit(&self, request: Request<UnitRequest>) -> RpcResult<UnitResponse> {
        let name = request.into_inner().unit_name;
        self.controller.unfreeze_unit(&name).await.map_err(|e| log_failure("unfreeze", &name, e))?;
        self.respond(&name).await
    }

    async fn get_unit_status(&self, request: Request<UnitRequest>) -> RpcResult<UnitResponse> {
        let name = request.into_inner().unit_name;
        debug!(unit = %name, "status request");
        self.respond(&name).await
    }

    type MonitorUnitStream = ReceiverStream<Result<UnitResourceResponse, Status>>;

    async fn monitor_unit(&self, request: Request<UnitResourceRequest>) -> RpcResult<Self::MonitorUnitStream> {
        let name = request.into_inner().unit_name;
        info!(unit = %name, "resource monitor request");
        let pid = self.controller.main_pid(&name).await.map_err(|e| log_failure("monitor", &name, e))?;
        let mut sampler = self.proc.sampler(pid).map_err(|e| Status::internal(e.to_string()))?;

        let (tx, rx) = mpsc::channel(4);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            for _ in 0..MONITOR_SAMPLES {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(MONITOR_INTERVAL) => {}
                }
                let item = sampler
                    .sample()
                    .map(|u| UnitResourceResponse { cpu_usage: u.cpu_usage, memory_usage: u.memory_usage })
                    .map_err(|e| Status::internal(format!("cannot fetch unit resources: {}", e)));
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    return;
                }
            }
            debug!(unit = %name, "resource monitor finished");
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
