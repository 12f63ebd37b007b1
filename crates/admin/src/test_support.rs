// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory agents for orchestrator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use givc_core::{parse_instance_name, LocaleAssignment, TransportConfig, UnitStatus};
use givc_wire::WireError;
use parking_lot::Mutex;
use tonic::Status;

use crate::agent::{AgentApi, AgentDialer};

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Loaded but stopped unit.
pub fn stopped_status(name: &str) -> UnitStatus {
    UnitStatus {
        name: name.to_string(),
        description: format!("{} unit", name),
        load_state: "loaded".to_string(),
        active_state: "inactive".to_string(),
        sub_state: "dead".to_string(),
        path: String::new(),
        freezer_state: "running".to_string(),
    }
}

fn running(name: &str) -> UnitStatus {
    UnitStatus {
        active_state: "active".to_string(),
        sub_state: "running".to_string(),
        ..stopped_status(name)
    }
}

/// Agent double that keeps unit states in a map.
#[derive(Default)]
pub struct FakeAgent {
    units: Mutex<HashMap<String, UnitStatus>>,
    calls: Mutex<Vec<String>>,
    hooks: Mutex<HashMap<String, Hook>>,
    locale: Mutex<Vec<LocaleAssignment>>,
    timezone: Mutex<String>,
    unreachable: AtomicBool,
    merge: AtomicBool,
    /// Units that refuse to become active when started
    broken: Mutex<Vec<String>>,
}

impl FakeAgent {
    pub fn set_unit(&self, status: UnitStatus) {
        self.units.lock().insert(status.name.clone(), status);
    }

    pub fn set_running(&self, name: &str) {
        self.set_unit(running(name));
    }

    pub fn unit(&self, name: &str) -> Option<UnitStatus> {
        self.units.lock().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make application starts reuse a running instance of the same base.
    pub fn set_merge(&self, merge: bool) {
        self.merge.store(merge, Ordering::SeqCst);
    }

    pub fn set_broken(&self, name: &str) {
        self.broken.lock().push(name.to_string());
    }

    /// Run `hook` whenever `unit` is started.
    pub fn on_start(&self, unit: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks.lock().insert(unit.to_string(), Arc::new(hook));
    }

    pub fn locale(&self) -> Vec<LocaleAssignment> {
        self.locale.lock().clone()
    }

    pub fn timezone(&self) -> String {
        self.timezone.lock().clone()
    }

    fn enter(&self, call: String) -> Result<(), Status> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Status::unavailable("agent unreachable"));
        }
        self.calls.lock().push(call);
        Ok(())
    }

    fn update(&self, unit: &str, f: impl FnOnce(&mut UnitStatus)) -> Result<UnitStatus, Status> {
        let mut units = self.units.lock();
        let status = units.get_mut(unit).ok_or_else(|| Status::not_found(format!("unit {} not found", unit)))?;
        f(status);
        Ok(status.clone())
    }

    fn start(&self, unit: &str) -> UnitStatus {
        let status = if self.broken.lock().iter().any(|b| b == unit) {
            UnitStatus { active_state: "failed".into(), sub_state: "failed".into(), ..stopped_status(unit) }
        } else {
            running(unit)
        };
        self.set_unit(status.clone());
        let hook = self.hooks.lock().get(unit).cloned();
        if let Some(hook) = hook {
            hook();
        }
        status
    }
}

#[async_trait]
impl AgentApi for FakeAgent {
    async fn get_unit_status(&self, unit: &str) -> Result<UnitStatus, Status> {
        self.enter(format!("status {}", unit))?;
        self.unit(unit).ok_or_else(|| Status::not_found(format!("unit {} not found", unit)))
    }

    async fn start_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        self.enter(format!("start {}", unit))?;
        Ok(self.start(unit))
    }

    async fn stop_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        self.enter(format!("stop {}", unit))?;
        self.update(unit, |s| {
            s.active_state = "inactive".into();
            s.sub_state = "dead".into();
        })
    }

    async fn freeze_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        self.enter(format!("freeze {}", unit))?;
        self.update(unit, |s| s.freezer_state = "frozen".into())
    }

    async fn unfreeze_unit(&self, unit: &str) -> Result<UnitStatus, Status> {
        self.enter(format!("unfreeze {}", unit))?;
        self.update(unit, |s| s.freezer_state = "running".into())
    }

    async fn start_application(&self, unit: &str, args: &[String]) -> Result<UnitStatus, Status> {
        self.enter(format!("app {} {}", unit, args.join(" ")).trim_end().to_string())?;
        if self.merge.load(Ordering::SeqCst) {
            let base = parse_instance_name(unit).map(|(b, _)| b.to_string());
            let existing = self
                .units
                .lock()
                .values()
                .find(|s| s.is_active() && parse_instance_name(&s.name).map(|(b, _)| b) == base.as_deref())
                .cloned();
            if let Some(existing) = existing {
                return Ok(existing);
            }
        }
        Ok(self.start(unit))
    }

    async fn set_locale(&self, assignments: &[LocaleAssignment]) -> Result<(), Status> {
        self.enter("locale".to_string())?;
        *self.locale.lock() = assignments.to_vec();
        Ok(())
    }

    async fn set_timezone(&self, timezone: &str) -> Result<(), Status> {
        self.enter(format!("timezone {}", timezone))?;
        *self.timezone.lock() = timezone.to_string();
        Ok(())
    }
}

/// Dialer handing out one [`FakeAgent`] per transport name.
#[derive(Clone, Default)]
pub struct FakeFleet {
    agents: Arc<Mutex<HashMap<String, Arc<FakeAgent>>>>,
}

impl FakeFleet {
    pub fn agent(&self, name: &str) -> Arc<FakeAgent> {
        self.agents.lock().entry(name.to_string()).or_default().clone()
    }
}

impl AgentDialer for FakeFleet {
    fn dial(&self, transport: &TransportConfig) -> Result<Arc<dyn AgentApi>, WireError> {
        transport.endpoint()?;
        Ok(self.agent(&transport.name))
    }
}
