// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed clients for the admin and agent services.
//!
//! Unary calls go through [`RetryPolicy`]. Calls that start something run
//! once, since a repeated launch is not harmless; streaming calls are not
//! retried either.

use givc_core::{LocaleAssignment, RegistryEntry, UnitStatus};
use tonic::transport::Channel;
use tonic::{Status, Streaming};

use crate::convert::unit_status_of;
use crate::endpoint::{EndpointConfig, WireError};
use crate::pb;
use crate::pb::admin::admin_service_client::AdminServiceClient;
use crate::pb::locale::locale_service_client::LocaleServiceClient;
use crate::pb::systemd::unit_control_service_client::UnitControlServiceClient;
use crate::retry::RetryPolicy;

/// Client for an agent's unit-control and locale services.
#[derive(Debug, Clone)]
pub struct AgentClient {
    channel: Channel,
    retry: RetryPolicy,
}

macro_rules! unit_call {
    ($self:ident, $method:ident, $unit:expr) => {
        unit_call!($self, $self.retry, $method, $unit)
    };
    ($self:ident, $retry:expr, $method:ident, $unit:expr) => {{
        let unit = $unit.to_string();
        $retry
            .call(|| {
                let mut client = $self.units();
                let req = pb::systemd::UnitRequest { unit_name: unit.clone() };
                async move { client.$method(req).await }
            })
            .await
            .map(|resp| unit_status_of(resp.into_inner()))
    }};
}

impl AgentClient {
    pub fn connect(endpoint: &EndpointConfig) -> Result<Self, WireError> {
        Ok(Self::from_channel(endpoint.connect()?))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self { channel, retry: RetryPolicy::default() }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn units(&self) -> UnitControlServiceClient<Channel> {
        UnitControlServiceClient::new(self.channel.clone())
    }

    fn locale(&self) -> LocaleServiceClient<Channel> {
        LocaleServiceClient::new(self.channel.clone())
    }

    pub async fn get_unit_status(&self, unit: &str) -> Result<UnitStatus, Status> {
        unit_call!(self, get_unit_status, unit)
    }

    pub async fn start_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        unit_call!(self, RetryPolicy::none(), start_unit, unit)
    }

    pub async fn stop_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        unit_call!(self, stop_unit, unit)
    }

    pub async fn kill_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        unit_call!(self, kill_unit, unit)
    }

    pub async fn freeze_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        unit_call!(self, freeze_unit, unit)
    }

    pub async fn unfreeze_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        unit_call!(self, unfreeze_unit, unit)
    }

    pub async fn start_application(&self, unit: &str, args: &[String]) -> Result<UnitStatus, Status> {
        RetryPolicy::none()
            .call(|| {
                let mut client = self.units();
                let req = pb::systemd::AppUnitRequest { unit_name: unit.to_string(), args: args.to_vec() };
                async move { client.start_application(req).await }
            })
            .await
            .map(|resp| unit_status_of(resp.into_inner()))
    }

    pub async fn monitor_unit(
        &self,
        unit: &str,
    ) -> Result<Streaming<pb::systemd::UnitResourceResponse>, Status> {
        let req = pb::systemd::UnitResourceRequest { unit_name: unit.to_string() };
        Ok(self.units().monitor_unit(req).await?.into_inner())
    }

    pub async fn set_locale(&self, assignments: &[LocaleAssignment]) -> Result<(), Status> {
        let assignments: Vec<pb::locale::LocaleAssignment> =
            assignments.iter().cloned().map(Into::into).collect();
        self.retry
            .call(|| {
                let mut client = self.locale();
                let req = pb::locale::LocaleMessage { assignments: assignments.clone() };
                async move { client.locale_set(req).await }
            })
            .await
            .map(|_| ())
    }

    pub async fn set_timezone(&self, timezone: &str) -> Result<(), Status> {
        self.retry
            .call(|| {
                let mut client = self.locale();
                let req = pb::locale::TimezoneMessage { timezone: timezone.to_string() };
                async move { client.timezone_set(req).await }
            })
            .await
            .map(|_| ())
    }
}

/// Client for the admin service, used by agents (registration) and the CLI.
#[derive(Debug, Clone)]
pub struct AdminClient {
    channel: Channel,
    retry: RetryPolicy,
}

macro_rules! admin_call {
    ($self:ident, $method:ident, $req:expr) => {
        admin_call!($self, $self.retry, $method, $req)
    };
    ($self:ident, $retry:expr, $method:ident, $req:expr) => {{
        let req = $req;
        $retry
            .call(|| {
                let mut client = $self.admin();
                let req = req.clone();
                async move { client.$method(req).await }
            })
            .await
            .map(tonic::Response::into_inner)
    }};
}

impl AdminClient {
    pub fn connect(endpoint: &EndpointConfig) -> Result<Self, WireError> {
        Ok(Self::from_channel(endpoint.connect()?))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self { channel, retry: RetryPolicy::default() }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn admin(&self) -> AdminServiceClient<Channel> {
        AdminServiceClient::new(self.channel.clone())
    }

    /// Register `entry`. A registry-side rejection comes back as `Ok(Some(reason))`.
    pub async fn register_service(&self, entry: RegistryEntry) -> Result<Option<String>, Status> {
        let req: pb::admin::RegistryRequest = entry.into();
        admin_call!(self, register_service, req).map(|resp| resp.error)
    }

    pub async fn start_application(
        &self,
        app: &str,
        vm: Option<&str>,
        args: &[String],
    ) -> Result<pb::admin::ApplicationResponse, Status> {
        admin_call!(self, RetryPolicy::none(), start_application, application_request(app, vm, args))
    }

    pub async fn pause_application(
        &self,
        app: &str,
        vm: Option<&str>,
    ) -> Result<pb::admin::ApplicationResponse, Status> {
        admin_call!(self, pause_application, application_request(app, vm, &[]))
    }

    pub async fn resume_application(
        &self,
        app: &str,
        vm: Option<&str>,
    ) -> Result<pb::admin::ApplicationResponse, Status> {
        admin_call!(self, resume_application, application_request(app, vm, &[]))
    }

    pub async fn stop_application(
        &self,
        app: &str,
        vm: Option<&str>,
    ) -> Result<pb::admin::ApplicationResponse, Status> {
        admin_call!(self, stop_application, application_request(app, vm, &[]))
    }

    pub async fn start_vm(&self, vm: &str) -> Result<String, Status> {
        let req = pb::admin::StartVmRequest { vm_name: vm.to_string() };
        admin_call!(self, RetryPolicy::none(), start_vm, req).map(|resp| resp.registry_id)
    }

    pub async fn start_service(&self, service: &str, vm: &str) -> Result<String, Status> {
        let req = pb::admin::StartServiceRequest { service_name: service.to_string(), vm_name: vm.to_string() };
        admin_call!(self, RetryPolicy::none(), start_service, req).map(|resp| resp.registry_id)
    }

    pub async fn get_unit_status(&self, vm: &str, unit: &str) -> Result<UnitStatus, Status> {
        let req = pb::admin::UnitStatusRequest { vm_name: vm.to_string(), unit_name: unit.to_string() };
        admin_call!(self, get_unit_status, req).map(Into::into)
    }

    pub async fn poweroff(&self) -> Result<(), Status> {
        admin_call!(self, poweroff, pb::admin::Empty {}).map(|_| ())
    }

    pub async fn reboot(&self) -> Result<(), Status> {
        admin_call!(self, reboot, pb::admin::Empty {}).map(|_| ())
    }

    pub async fn suspend(&self) -> Result<(), Status> {
        admin_call!(self, suspend, pb::admin::Empty {}).map(|_| ())
    }

    pub async fn wakeup(&self) -> Result<(), Status> {
        admin_call!(self, wakeup, pb::admin::Empty {}).map(|_| ())
    }

    pub async fn query_list(&self) -> Result<Vec<pb::admin::QueryListItem>, Status> {
        admin_call!(self, query_list, pb::admin::Empty {}).map(|resp| resp.list)
    }

    pub async fn set_locale(&self, assignments: &[LocaleAssignment]) -> Result<(), Status> {
        let req = pb::admin::LocaleRequest { assignments: assignments.iter().cloned().map(Into::into).collect() };
        admin_call!(self, set_locale, req).map(|_| ())
    }

    pub async fn set_timezone(&self, timezone: &str) -> Result<(), Status> {
        let req = pb::admin::TimezoneRequest { timezone: timezone.to_string() };
        admin_call!(self, set_timezone, req).map(|_| ())
    }

    /// Registry snapshot followed by live changes.
    pub async fn watch(&self) -> Result<Streaming<pb::admin::WatchItem>, Status> {
        Ok(self.admin().watch(pb::admin::Empty {}).await?.into_inner())
    }
}

fn application_request(app: &str, vm: Option<&str>, args: &[String]) -> pb::admin::ApplicationRequest {
    pb::admin::ApplicationRequest {
        app_name: app.to_string(),
        vm_name: vm.filter(|v| !v.is_empty()).map(str::to_string),
        args: args.to_vec(),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
