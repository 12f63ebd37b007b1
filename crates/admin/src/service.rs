// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `AdminService` RPC surface.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;
use givc_core::{AppRef, LocaleAssignment, RegistryEntry};
use givc_wire::pb::admin::admin_service_server::{AdminService, AdminServiceServer};
use givc_wire::pb::admin::{
    ApplicationRequest, ApplicationResponse, Empty, LocaleRequest, QueryListResponse, RegistryRequest,
    RegistryResponse, StartResponse, StartServiceRequest, StartVmRequest, TimezoneRequest, UnitStatusRequest,
    WatchItem,
};
use givc_wire::pb::systemd;
use givc_wire::{AuthInterceptor, ConvertError, CMD_FAILURE, CMD_SUCCESS};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

use crate::error::AdminError;
use crate::orchestrator::{ControlOp, Orchestrator};
use crate::query;

type RpcResult<T> = Result<Response<T>, Status>;

/// gRPC front of the orchestrator.
#[derive(Clone)]
pub struct AdminRpc {
    orchestrator: Arc<Orchestrator>,
    shutdown: CancellationToken,
}

impl AdminRpc {
    pub fn new(orchestrator: Arc<Orchestrator>, shutdown: CancellationToken) -> Self {
        Self { orchestrator, shutdown }
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<AdminServiceServer<Self>, AuthInterceptor> {
        AdminServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }
}

fn app_ref(req: &ApplicationRequest) -> Result<AppRef, AdminError> {
    if req.app_name.is_empty() {
        return Err(AdminError::Validation("application name is empty".into()));
    }
    Ok(match req.vm_name.as_deref().filter(|vm| !vm.is_empty()) {
        Some(vm) => AppRef::parse(&format!("{}:{}", req.app_name, vm)),
        None => AppRef::parse(&req.app_name),
    })
}

fn failed(op: &str, err: AdminError) -> Status {
    error!(op, "{}", err);
    err.into()
}

/// Application calls answer with a response either way; a failure carries
/// `CMD_FAILURE` and the error text instead of an RPC error.
fn app_outcome(op: &str, result: Result<String, AdminError>) -> Response<ApplicationResponse> {
    let (cmd_status, app_status) = match result {
        Ok(app_status) => (CMD_SUCCESS, app_status),
        Err(e) => {
            error!(op, "{}", e);
            (CMD_FAILURE, e.to_string())
        }
    };
    Response::new(ApplicationResponse { cmd_status: cmd_status.to_string(), app_status })
}

impl AdminRpc {
    async fn control(&self, op: ControlOp, request: Request<ApplicationRequest>) -> RpcResult<ApplicationResponse> {
        let result = match app_ref(request.get_ref()) {
            Ok(app) => {
                info!(app = %app.name, ?op, "control request");
                self.orchestrator.control_application(op, &app).await.map(|units| units.join(", "))
            }
            Err(e) => Err(e),
        };
        Ok(app_outcome("control", result))
    }
}

#[tonic::async_trait]
impl AdminService for AdminRpc {
    async fn register_service(&self, request: Request<RegistryRequest>) -> RpcResult<RegistryResponse> {
        let entry = RegistryEntry::try_from(request.into_inner()).map_err(|e: ConvertError| {
            warn!("rejecting registration: {}", e);
            Status::from(e)
        })?;
        self.orchestrator.register_service(entry).await.map_err(|e| failed("register", e))?;
        Ok(Response::new(RegistryResponse { error: None }))
    }

    async fn start_application(&self, request: Request<ApplicationRequest>) -> RpcResult<ApplicationResponse> {
        let result = match app_ref(request.get_ref()) {
            Ok(app) => self.orchestrator.start_application(&app, &request.get_ref().args).await,
            Err(e) => Err(e),
        };
        Ok(app_outcome("start application", result))
    }

    async fn start_vm(&self, request: Request<StartVmRequest>) -> RpcResult<StartResponse> {
        let vm = request.into_inner().vm_name;
        let registry_id = self.orchestrator.start_vm(&vm).await.map_err(|e| failed("start vm", e))?;
        Ok(Response::new(StartResponse { registry_id }))
    }

    async fn start_service(&self, request: Request<StartServiceRequest>) -> RpcResult<StartResponse> {
        let req = request.into_inner();
        let registry_id = self
            .orchestrator
            .start_service(&req.service_name, &req.vm_name)
            .await
            .map_err(|e| failed("start service", e))?;
        Ok(Response::new(StartResponse { registry_id }))
    }

    async fn pause_application(&self, request: Request<ApplicationRequest>) -> RpcResult<ApplicationResponse> {
        self.control(ControlOp::Pause, request).await
    }

    async fn resume_application(&self, request: Request<ApplicationRequest>) -> RpcResult<ApplicationResponse> {
        self.control(ControlOp::Resume, request).await
    }

    async fn stop_application(&self, request: Request<ApplicationRequest>) -> RpcResult<ApplicationResponse> {
        self.control(ControlOp::Stop, request).await
    }

    async fn get_unit_status(&self, request: Request<UnitStatusRequest>) -> RpcResult<systemd::UnitStatus> {
        let req = request.into_inner();
        let status = self
            .orchestrator
            .get_unit_status(&req.vm_name, &req.unit_name)
            .await
            .map_err(|e| failed("unit status", e))?;
        Ok(Response::new(status.into()))
    }

    async fn poweroff(&self, _request: Request<Empty>) -> RpcResult<Empty> {
        self.orchestrator.poweroff().await.map_err(|e| failed("poweroff", e))?;
        Ok(Response::new(Empty {}))
    }

    async fn reboot(&self, _request: Request<Empty>) -> RpcResult<Empty> {
        self.orchestrator.reboot().await.map_err(|e| failed("reboot", e))?;
        Ok(Response::new(Empty {}))
    }

    async fn suspend(&self, _request: Request<Empty>) -> RpcResult<Empty> {
        self.orchestrator.suspend().await.map_err(|e| failed("suspend", e))?;
        Ok(Response::new(Empty {}))
    }

    async fn wakeup(&self, _request: Request<Empty>) -> RpcResult<Empty> {
        self.orchestrator.wakeup().await?;
        Ok(Response::new(Empty {}))
    }

    async fn query_list(&self, _request: Request<Empty>) -> RpcResult<QueryListResponse> {
        Ok(Response::new(query::query_list(self.orchestrator.registry())))
    }

    async fn set_locale(&self, request: Request<LocaleRequest>) -> RpcResult<Empty> {
        let assignments = request
            .into_inner()
            .assignments
            .into_iter()
            .map(LocaleAssignment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.orchestrator.set_locale(assignments).await.map_err(|e| failed("set locale", e))?;
        Ok(Response::new(Empty {}))
    }

    async fn set_timezone(&self, request: Request<TimezoneRequest>) -> RpcResult<Empty> {
        let timezone = request.into_inner().timezone;
        self.orchestrator.set_timezone(&timezone).await.map_err(|e| failed("set timezone", e))?;
        Ok(Response::new(Empty {}))
    }

    type WatchStream = Pin<Box<dyn Stream<Item = Result<WatchItem, Status>> + Send>>;

    async fn watch(&self, _request: Request<Empty>) -> RpcResult<Self::WatchStream> {
        let (snapshot, rx) = self.orchestrator.registry().subscribe();
        debug!(entries = snapshot.len(), "watch subscriber attached");

        let initial = futures_util::stream::once(std::future::ready(Ok(query::initial_item(&snapshot))));
        let updates = tokio_stream::StreamExt::map_while(BroadcastStream::new(rx), |event| match event {
            Ok(event) => Some(Ok(query::watch_item(&event))),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                warn!(missed, "watch subscriber lagged, closing stream");
                None
            }
        });
        let stream = futures_util::StreamExt::take_until(
            futures_util::StreamExt::chain(initial, updates),
            self.shutdown.clone().cancelled_owned(),
        );
        Ok(Response::new(Box::pin(stream)))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
