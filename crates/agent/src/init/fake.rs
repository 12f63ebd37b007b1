// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory init system for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use givc_core::UnitStatus;
use parking_lot::Mutex;

use super::{InitError, InitSystem, TransientUnit, JOB_DONE};

#[derive(Debug, Clone)]
struct FakeUnit {
    status: UnitStatus,
    exec_start: Vec<String>,
    main_pid: u32,
}

fn unit_status(name: &str, active: bool) -> UnitStatus {
    UnitStatus {
        name: name.to_string(),
        description: format!("{} unit", name),
        load_state: "loaded".to_string(),
        active_state: if active { "active" } else { "inactive" }.to_string(),
        sub_state: if active { "running" } else { "dead" }.to_string(),
        path: format!("/org/freedesktop/systemd1/unit/{}", name.replace(['@', '.', '-'], "_")),
        freezer_state: "running".to_string(),
    }
}

/// Units live in a map; jobs complete instantly with `done` unless a
/// different result is queued for the unit.
#[derive(Default)]
pub struct FakeInit {
    units: Mutex<BTreeMap<String, FakeUnit>>,
    job_results: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    next_pid: AtomicU32,
    /// Transient units whose command matches a running instance exit at once
    merging: AtomicBool,
    /// Transient units enter `failed` right after starting
    crashing: AtomicBool,
    /// Transient units run to completion right after starting
    exiting: AtomicBool,
    no_freezer: AtomicBool,
}

impl FakeInit {
    pub fn with_units(names: &[&str]) -> Self {
        let init = Self::default();
        for name in names {
            init.add_unit(name, true);
        }
        init
    }

    pub fn add_unit(&self, name: &str, active: bool) {
        let pid = if active { self.pid() } else { 0 };
        self.units
            .lock()
            .insert(name.to_string(), FakeUnit { status: unit_status(name, active), exec_start: vec![], main_pid: pid });
    }

    pub fn set_exec_start(&self, name: &str, command: &str) {
        if let Some(unit) = self.units.lock().get_mut(name) {
            unit.exec_start = vec![command.to_string()];
        }
    }

    pub fn set_active_state(&self, name: &str, active_state: &str, sub_state: &str) {
        if let Some(unit) = self.units.lock().get_mut(name) {
            unit.status.active_state = active_state.to_string();
            unit.status.sub_state = sub_state.to_string();
        }
    }

    /// Result reported by the next job for `unit`.
    pub fn set_job_result(&self, unit: &str, result: &str) {
        self.job_results.lock().insert(unit.to_string(), result.to_string());
    }

    pub fn set_merging(&self, merging: bool) {
        self.merging.store(merging, Ordering::SeqCst);
    }

    pub fn set_crashing(&self, crashing: bool) {
        self.crashing.store(crashing, Ordering::SeqCst);
    }

    pub fn set_exiting(&self, exiting: bool) {
        self.exiting.store(exiting, Ordering::SeqCst);
    }

    /// Make `FreezerState` unreadable.
    pub fn set_no_freezer(&self, missing: bool) {
        self.no_freezer.store(missing, Ordering::SeqCst);
    }

    pub fn unit(&self, name: &str) -> Option<UnitStatus> {
        self.units.lock().get(name).map(|u| u.status.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn pid(&self) -> u32 {
        1000 + self.next_pid.fetch_add(1, Ordering::SeqCst)
    }

    fn job_result(&self, unit: &str) -> String {
        self.job_results.lock().remove(unit).unwrap_or_else(|| JOB_DONE.to_string())
    }

    fn with_unit<T>(&self, name: &str, f: impl FnOnce(&mut FakeUnit) -> T) -> Result<T, InitError> {
        let mut units = self.units.lock();
        let unit = units.get_mut(name).ok_or_else(|| InitError::Failed(format!("Unit {} not loaded.", name)))?;
        Ok(f(unit))
    }
}

fn matches_instance_pattern(name: &str) -> bool {
    name.contains('@') && name.ends_with(".service")
}

#[async_trait]
impl InitSystem for FakeInit {
    async fn list_units_by_names(&self, names: &[String]) -> Result<Vec<UnitStatus>, InitError> {
        let units = self.units.lock();
        Ok(names.iter().filter_map(|n| units.get(n)).map(|u| u.status.clone()).collect())
    }

    async fn list_active_units(&self, pattern: &str) -> Result<Vec<UnitStatus>, InitError> {
        self.record(format!("list-active {}", pattern));
        let units = self.units.lock();
        Ok(units
            .values()
            .filter(|u| u.status.is_active() && matches_instance_pattern(&u.status.name))
            .map(|u| u.status.clone())
            .collect())
    }

    async fn restart_unit(&self, name: &str) -> Result<String, InitError> {
        self.record(format!("restart {}", name));
        let result = self.job_result(name);
        let pid = self.pid();
        self.with_unit(name, |u| {
            if result == JOB_DONE {
                u.status.active_state = "active".into();
                u.status.sub_state = "running".into();
                u.main_pid = pid;
            } else {
                u.status.active_state = "failed".into();
                u.status.sub_state = "failed".into();
            }
        })?;
        Ok(result)
    }

    async fn stop_unit(&self, name: &str) -> Result<String, InitError> {
        self.record(format!("stop {}", name));
        let result = self.job_result(name);
        self.with_unit(name, |u| {
            if result == JOB_DONE {
                u.status.active_state = "inactive".into();
                u.status.sub_state = "dead".into();
                u.main_pid = 0;
            }
        })?;
        Ok(result)
    }

    async fn kill_unit(&self, name: &str, signal: i32) -> Result<(), InitError> {
        self.record(format!("kill {} {}", name, signal));
        self.with_unit(name, |u| {
            u.status.active_state = "failed".into();
            u.status.sub_state = "failed".into();
            u.main_pid = 0;
        })
    }

    async fn freeze_unit(&self, name: &str) -> Result<(), InitError> {
        self.record(format!("freeze {}", name));
        self.with_unit(name, |u| u.status.freezer_state = "frozen".into())
    }

    async fn thaw_unit(&self, name: &str) -> Result<(), InitError> {
        self.record(format!("thaw {}", name));
        self.with_unit(name, |u| u.status.freezer_state = "running".into())
    }

    async fn freezer_state(&self, name: &str) -> Result<String, InitError> {
        if self.no_freezer.load(Ordering::SeqCst) {
            return Err(InitError::Failed("property FreezerState unavailable".into()));
        }
        self.with_unit(name, |u| u.status.freezer_state.clone())
    }

    async fn exec_start(&self, name: &str) -> Result<Vec<String>, InitError> {
        self.with_unit(name, |u| u.exec_start.clone())
    }

    async fn main_pid(&self, name: &str) -> Result<u32, InitError> {
        self.with_unit(name, |u| u.main_pid)
    }

    async fn start_transient_unit(&self, unit: &TransientUnit) -> Result<String, InitError> {
        self.record(format!("transient {} {}", unit.name, unit.argv.join(" ")));
        let result = self.job_result(&unit.name);
        if result != JOB_DONE {
            return Ok(result);
        }

        let command = unit.argv.join(" ");
        let merged = self.merging.load(Ordering::SeqCst)
            && self.units.lock().values().any(|u| {
                u.status.is_active()
                    && matches_instance_pattern(&u.status.name)
                    && unit.argv.first().is_some_and(|argv0| u.exec_start.iter().any(|e| e.contains(argv0)))
            });

        let exited = merged || self.exiting.load(Ordering::SeqCst);
        let mut status = unit_status(&unit.name, !exited);
        status.description = unit.description.clone();
        if self.crashing.load(Ordering::SeqCst) {
            status.active_state = "failed".into();
            status.sub_state = "failed".into();
        }
        let main_pid = if status.is_active() { self.pid() } else { 0 };
        self.units.lock().insert(unit.name.clone(), FakeUnit { status, exec_start: vec![command], main_pid });
        Ok(result)
    }
}
