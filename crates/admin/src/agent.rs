// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound calls from the admin to agents.
//!
//! The orchestrator only sees [`AgentApi`]; [`GrpcDialer`] backs it with real
//! gRPC channels, tests swap in an in-memory fleet.

use std::sync::Arc;

use async_trait::async_trait;
use givc_core::{LocaleAssignment, TransportConfig, UnitStatus};
use givc_wire::tls::TlsCredentials;
use givc_wire::{AgentClient, EndpointConfig, WireError};
use tonic::Status;

/// Unit control operations the admin issues against one agent.
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn get_unit_status(&self, unit: &str) -> Result<UnitStatus, Status>;
    async fn start_unit(&self, unit: &str) -> Result<UnitStatus, Status>;
    async fn stop_unit(&self, unit: &str) -> Result<UnitStatus, Status>;
    async fn freeze_unit(&self, unit: &str) -> Result<UnitStatus, Status>;
    async fn unfreeze_unit(&self, unit: &str) -> Result<UnitStatus, Status>;
    async fn start_application(&self, unit: &str, args: &[String]) -> Result<UnitStatus, Status>;
    async fn set_locale(&self, assignments: &[LocaleAssignment]) -> Result<(), Status>;
    async fn set_timezone(&self, timezone: &str) -> Result<(), Status>;
}

/// Opens an [`AgentApi`] for a transport.
pub trait AgentDialer: Send + Sync {
    fn dial(&self, transport: &TransportConfig) -> Result<Arc<dyn AgentApi>, WireError>;
}

#[async_trait]
impl AgentApi for AgentClient {
    async fn get_unit_status(&self, unit: &str) -> Result<UnitStatus, Status> {
        AgentClient::get_unit_status(self, unit).await
    }

    async fn start_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        AgentClient::start_unit(self, unit).await
    }

    async fn stop_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        AgentClient::stop_unit(self, unit).await
    }

    async fn freeze_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        AgentClient::freeze_unit(self, unit).await
    }

    async fn unfreeze_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        AgentClient::unfreeze_unit(self, unit).await
    }

    async fn start_application(&self, unit: &str, args: &[String]) -> Result<UnitStatus, Status> {
        AgentClient::start_application(self, unit, args).await
    }

    async fn set_locale(&self, assignments: &[LocaleAssignment]) -> Result<(), Status> {
        AgentClient::set_locale(self, assignments).await
    }

    async fn set_timezone(&self, timezone: &str) -> Result<(), Status> {
        AgentClient::set_timezone(self, timezone).await
    }
}

/// Dials agents over gRPC, using the admin's TLS identity when configured.
#[derive(Debug, Clone, Default)]
pub struct GrpcDialer {
    tls: Option<TlsCredentials>,
}

impl GrpcDialer {
    pub fn new(tls: Option<TlsCredentials>) -> Self {
        Self { tls }
    }
}

impl AgentDialer for GrpcDialer {
    fn dial(&self, transport: &TransportConfig) -> Result<Arc<dyn AgentApi>, WireError> {
        let client = AgentClient::connect(&EndpointConfig::new(transport.clone(), self.tls.clone()))?;
        Ok(Arc::new(client))
    }
}
