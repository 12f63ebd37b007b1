// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consumer side: `EventService` driving a virtual device.

use std::sync::Arc;

use givc_wire::pb::event::event_service_server::{EventService, EventServiceServer};
use givc_wire::pb::event::{Ack, DeviceInfo, InputEvent};
use givc_wire::AuthInterceptor;
use parking_lot::Mutex;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use super::{
    DeviceClass, DeviceIdentity, RawEvent, VirtualDevice, VirtualDeviceFactory, ACK_OK, ACK_STREAM_ERROR,
};

type RpcResult<T> = Result<Response<T>, Status>;

#[derive(Clone)]
pub struct EventConsumer {
    factory: Arc<dyn VirtualDeviceFactory>,
    device: Arc<Mutex<Option<Box<dyn VirtualDevice>>>>,
}

impl EventConsumer {
    pub fn new(factory: Arc<dyn VirtualDeviceFactory>) -> Self {
        Self { factory, device: Arc::new(Mutex::new(None)) }
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<EventServiceServer<Self>, AuthInterceptor> {
        EventServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }

    pub fn has_device(&self) -> bool {
        self.device.lock().is_some()
    }

    fn forward(&self, event: &InputEvent) -> Result<(), Status> {
        let raw = RawEvent::try_from(event).map_err(|e| Status::invalid_argument(e.to_string()))?;
        let mut guard = self.device.lock();
        let device = guard.as_mut().ok_or_else(|| Status::failed_precondition("no virtual device registered"))?;
        device.emit(&[raw]).map_err(|e| Status::internal(e.to_string()))
    }

    fn close_device(&self) {
        if self.device.lock().take().is_some() {
            info!("virtual device closed");
        }
    }
}

#[tonic::async_trait]
impl EventService for EventConsumer {
    async fn register_device(&self, request: Request<DeviceInfo>) -> RpcResult<Ack> {
        let info = request.into_inner();
        let class = DeviceClass::classify(&info.name).ok_or_else(|| {
            warn!(device = %info.name, "rejecting device");
            Status::invalid_argument("unsupported device")
        })?;
        let identity = DeviceIdentity {
            vendor_id: u16::try_from(info.vendor_id).unwrap_or_default(),
            product_id: u16::try_from(info.device_id).unwrap_or_default(),
            name: info.name,
        };
        let device = self.factory.create(class, &identity).map_err(|e| {
            warn!(device = %identity.name, "failed to create virtual device: {}", e);
            Status::internal(e.to_string())
        })?;
        *self.device.lock() = Some(device);
        info!(device = %identity.name, ?class, "device registered");
        Ok(Response::new(Ack { status: ACK_OK.to_string() }))
    }

    async fn stream_events(&self, request: Request<Streaming<InputEvent>>) -> RpcResult<Ack> {
        let mut stream = request.into_inner();
        loop {
            match stream.message().await {
                Ok(Some(event)) => {
                    debug!(r#type = event.r#type, code = event.code, value = event.value, "input event");
                    if let Err(status) = self.forward(&event) {
                        warn!("dropping input event: {}", status.message());
                    }
                }
                Ok(None) => {
                    info!("event stream finished");
                    return Ok(Response::new(Ack { status: ACK_OK.to_string() }));
                }
                Err(status) => {
                    warn!("event stream failed: {}", status.message());
                    self.close_device();
                    return Ok(Response::new(Ack { status: ACK_STREAM_ERROR.to_string() }));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
