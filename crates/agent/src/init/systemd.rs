// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! systemd over D-Bus.
//!
//! One bus connection is shared by every operation. Jobs are awaited through
//! the manager's `JobRemoved` signal, subscribed before the job is queued so
//! a fast job cannot finish unobserved.

use std::future::Future;

use async_trait::async_trait;
use futures_util::StreamExt;
use givc_core::UnitStatus;
use nix::unistd::Uid;
use tracing::{debug, info};
use zbus::fdo::PropertiesProxy;
use zbus::names::InterfaceName;
use zbus::proxy;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::Connection;

use super::{InitError, InitSystem, TransientUnit};

const DESTINATION: &str = "org.freedesktop.systemd1";
const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";
const SERVICE_INTERFACE: &str = "org.freedesktop.systemd1.Service";
const MODE_REPLACE: &str = "replace";

/// `ListUnits*` record: name, description, load, active, sub, following,
/// object path, job id, job type, job path.
type UnitRecord = (String, String, String, String, String, String, OwnedObjectPath, u32, String, OwnedObjectPath);

type AuxUnits<'a> = &'a [(&'a str, &'a [(&'a str, Value<'a>)])];

#[proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
trait Manager {
    fn subscribe(&self) -> zbus::Result<()>;

    fn list_units_by_names(&self, names: &[&str]) -> zbus::Result<Vec<UnitRecord>>;

    fn list_units_by_patterns(&self, states: &[&str], patterns: &[&str]) -> zbus::Result<Vec<UnitRecord>>;

    fn load_unit(&self, name: &str) -> zbus::Result<OwnedObjectPath>;

    fn restart_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    fn stop_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    fn kill_unit(&self, name: &str, whom: &str, signal: i32) -> zbus::Result<()>;

    fn freeze_unit(&self, name: &str) -> zbus::Result<()>;

    fn thaw_unit(&self, name: &str) -> zbus::Result<()>;

    fn start_transient_unit(
        &self,
        name: &str,
        mode: &str,
        properties: &[(&str, Value<'_>)],
        aux: AuxUnits<'_>,
    ) -> zbus::Result<OwnedObjectPath>;

    #[zbus(signal)]
    fn job_removed(&self, id: u32, job: OwnedObjectPath, unit: String, result: String) -> zbus::Result<()>;
}

fn status_of(record: UnitRecord) -> UnitStatus {
    let (name, description, load_state, active_state, sub_state, _following, path, ..) = record;
    UnitStatus {
        name,
        description,
        load_state,
        active_state,
        sub_state,
        path: path.to_string(),
        freezer_state: String::new(),
    }
}

/// [`InitSystem`] backed by the systemd manager.
pub struct SystemdInit {
    conn: Connection,
    manager: ManagerProxy<'static>,
}

impl SystemdInit {
    /// Connect to the system bus as root, the session bus otherwise.
    pub async fn connect() -> Result<Self, InitError> {
        let conn = if Uid::effective().is_root() { Connection::system().await? } else { Connection::session().await? };
        let manager = ManagerProxy::new(&conn).await?;
        manager.subscribe().await?;
        info!(user = !Uid::effective().is_root(), "connected to systemd");
        Ok(Self { conn, manager })
    }

    async fn property(&self, unit: &str, interface: &'static str, name: &str) -> Result<OwnedValue, InitError> {
        let path = self.manager.load_unit(unit).await?;
        let props = PropertiesProxy::builder(&self.conn).destination(DESTINATION)?.path(path)?.build().await?;
        let value = props
            .get(InterfaceName::from_static_str_unchecked(interface), name)
            .await
            .map_err(zbus::Error::from)?;
        Ok(value)
    }

    /// Queue a job with `queue` and wait for its result.
    async fn run_job<F, Fut>(&self, unit: &str, queue: F) -> Result<String, InitError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = zbus::Result<OwnedObjectPath>> + Send,
    {
        let mut removed = self.manager.receive_job_removed().await?;
        let job = queue().await?;
        debug!(unit, job = %job, "job queued");
        while let Some(signal) = removed.next().await {
            let args = signal.args()?;
            if args.job() == &job {
                return Ok(args.result().to_string());
            }
        }
        Err(InitError::JobLost(unit.to_string()))
    }
}

#[async_trait]
impl InitSystem for SystemdInit {
    async fn list_units_by_names(&self, names: &[String]) -> Result<Vec<UnitStatus>, InitError> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let records = self.manager.list_units_by_names(&names).await?;
        Ok(records.into_iter().map(status_of).collect())
    }

    async fn list_active_units(&self, pattern: &str) -> Result<Vec<UnitStatus>, InitError> {
        let records = self.manager.list_units_by_patterns(&["active"], &[pattern]).await?;
        Ok(records.into_iter().map(status_of).collect())
    }

    async fn restart_unit(&self, name: &str) -> Result<String, InitError> {
        self.run_job(name, || self.manager.restart_unit(name, MODE_REPLACE)).await
    }

    async fn stop_unit(&self, name: &str) -> Result<String, InitError> {
        self.run_job(name, || self.manager.stop_unit(name, MODE_REPLACE)).await
    }

    async fn kill_unit(&self, name: &str, signal: i32) -> Result<(), InitError> {
        Ok(self.manager.kill_unit(name, "all", signal).await?)
    }

    async fn freeze_unit(&self, name: &str) -> Result<(), InitError> {
        Ok(self.manager.freeze_unit(name).await?)
    }

    async fn thaw_unit(&self, name: &str) -> Result<(), InitError> {
        Ok(self.manager.thaw_unit(name).await?)
    }

    async fn freezer_state(&self, name: &str) -> Result<String, InitError> {
        let value = self.property(name, UNIT_INTERFACE, "FreezerState").await?;
        Ok(String::try_from(value).map_err(zbus::Error::from)?)
    }

    async fn exec_start(&self, name: &str) -> Result<Vec<String>, InitError> {
        let value = self.property(name, SERVICE_INTERFACE, "ExecStart").await?;
        Ok(vec![format!("{}", &*value)])
    }

    async fn main_pid(&self, name: &str) -> Result<u32, InitError> {
        let value = self.property(name, SERVICE_INTERFACE, "MainPID").await?;
        Ok(u32::try_from(value).map_err(zbus::Error::from)?)
    }

    async fn start_transient_unit(&self, unit: &TransientUnit) -> Result<String, InitError> {
        let path = unit.argv.first().cloned().unwrap_or_default();
        let exec_start = vec![(path, unit.argv.clone(), false)];
        let properties = [
            ("Description", Value::from(unit.description.as_str())),
            ("ExecStart", Value::from(exec_start)),
            ("Type", Value::from("exec")),
            ("Environment", Value::from(unit.environment.clone())),
        ];
        let aux: AuxUnits<'_> = &[];
        self.run_job(&unit.name, || self.manager.start_transient_unit(&unit.name, MODE_REPLACE, &properties, aux))
            .await
    }
}
