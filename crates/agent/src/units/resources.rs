// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process CPU and memory usage from procfs.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_PROC_ROOT: &str = "/proc";

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("malformed {path}: {reason}")]
    Parse { path: PathBuf, reason: &'static str },
}

/// One usage sample for a process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    /// Percent of one CPU used since the previous sample
    pub cpu_usage: f64,
    /// Resident set as a percent of total memory
    pub memory_usage: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CpuTicks {
    process: u64,
    total: u64,
    cpus: u32,
}

/// Reads process statistics below a procfs root.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, rel: impl AsRef<Path>) -> Result<(PathBuf, String), ResourceError> {
        let path = self.root.join(rel);
        let text = std::fs::read_to_string(&path).map_err(|source| ResourceError::Read { path: path.clone(), source })?;
        Ok((path, text))
    }

    fn cpu_ticks(&self, pid: u32) -> Result<CpuTicks, ResourceError> {
        let (path, stat) = self.read(format!("{}/stat", pid))?;
        let process = process_ticks(&stat).ok_or(ResourceError::Parse { path, reason: "no utime/stime fields" })?;
        let (path, stat) = self.read("stat")?;
        let (total, cpus) = total_ticks(&stat).ok_or(ResourceError::Parse { path, reason: "no cpu line" })?;
        Ok(CpuTicks { process, total, cpus })
    }

    /// Resident memory of `pid` as a percent of `MemTotal`.
    pub fn memory_percent(&self, pid: u32) -> Result<f32, ResourceError> {
        let (path, status) = self.read(format!("{}/status", pid))?;
        let rss = kib_field(&status, "VmRSS:").ok_or(ResourceError::Parse { path, reason: "no VmRSS" })?;
        let (path, meminfo) = self.read("meminfo")?;
        let total = kib_field(&meminfo, "MemTotal:")
            .filter(|t| *t > 0)
            .ok_or(ResourceError::Parse { path, reason: "no MemTotal" })?;
        Ok((rss as f64 / total as f64 * 100.0) as f32)
    }

    /// Start sampling `pid`; the first sample covers the time since this call.
    pub fn sampler(&self, pid: u32) -> Result<UsageSampler, ResourceError> {
        let last = self.cpu_ticks(pid)?;
        Ok(UsageSampler { proc: self.clone(), pid, last })
    }
}

/// Successive usage samples for one process.
#[derive(Debug)]
pub struct UsageSampler {
    proc: ProcFs,
    pid: u32,
    last: CpuTicks,
}

impl UsageSampler {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn sample(&mut self) -> Result<ResourceUsage, ResourceError> {
        let now = self.proc.cpu_ticks(self.pid)?;
        let cpu_usage = cpu_percent(self.last, now);
        self.last = now;
        let memory_usage = self.proc.memory_percent(self.pid)?;
        Ok(ResourceUsage { cpu_usage, memory_usage })
    }
}

fn cpu_percent(before: CpuTicks, after: CpuTicks) -> f64 {
    let total = after.total.saturating_sub(before.total);
    if total == 0 {
        return 0.0;
    }
    let process = after.process.saturating_sub(before.process);
    process as f64 / total as f64 * f64::from(after.cpus.max(1)) * 100.0
}

/// `utime + stime` from `/proc/<pid>/stat`.
///
/// The command name may contain spaces, so fields are counted from the last `)`.
fn process_ticks(stat: &str) -> Option<u64> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    // fields after comm start at `state` (3); utime is 14, stime 15
    let utime: u64 = fields.nth(11)?.parse().ok()?;
    let stime: u64 = fields.next()?.parse().ok()?;
    Some(utime + stime)
}

/// Sum of the aggregate `cpu` line and the number of `cpuN` lines in `/proc/stat`.
fn total_ticks(stat: &str) -> Option<(u64, u32)> {
    let mut total = None;
    let mut cpus = 0;
    for line in stat.lines() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("cpu") => total = Some(fields.filter_map(|f| f.parse::<u64>().ok()).sum()),
            Some(label) if label.starts_with("cpu") => cpus += 1,
            _ => {}
        }
    }
    total.map(|t| (t, cpus))
}

fn kib_field(text: &str, key: &str) -> Option<u64> {
    text.lines().find_map(|line| line.strip_prefix(key)).and_then(|v| v.split_whitespace().next()?.parse().ok())
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
