// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

const PID: u32 = 4242;

fn pid_stat(utime: u64, stime: u64) -> String {
    format!("{} (Web Content) S 1 4242 4242 0 -1 4194560 1 0 0 0 {} {} 0 0 20 0 12 0 100 0 0\n", PID, utime, stime)
}

fn system_stat(total_user: u64) -> String {
    format!(
        "cpu  {} 0 0 0 0 0 0 0 0 0\ncpu0 1 0 0 0 0 0 0 0 0 0\ncpu1 1 0 0 0 0 0 0 0 0 0\nintr 0\n",
        total_user
    )
}

fn procfs() -> (TempDir, ProcFs) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(PID.to_string())).unwrap();
    write(&dir, &format!("{}/stat", PID), &pid_stat(100, 50));
    write(&dir, "stat", &system_stat(10_000));
    write(&dir, &format!("{}/status", PID), "Name:\tfoot\nVmRSS:\t  204800 kB\nThreads:\t3\n");
    write(&dir, "meminfo", "MemTotal:        8192000 kB\nMemFree:         100 kB\n");
    let proc = ProcFs::new(dir.path());
    (dir, proc)
}

fn write(dir: &TempDir, rel: &str, contents: &str) {
    std::fs::write(dir.path().join(rel), contents).unwrap();
}

#[test]
fn process_ticks_skip_command_with_spaces() {
    assert_eq!(process_ticks(&pid_stat(7, 3)), Some(10));
    assert_eq!(process_ticks("1 (a) b) S 1"), None);
}

#[test]
fn total_ticks_counts_cpus() {
    assert_eq!(total_ticks(&system_stat(500)), Some((500, 2)));
    assert_eq!(total_ticks("intr 0\n"), None);
}

#[test]
fn memory_percent_from_rss() {
    let (_dir, proc) = procfs();
    let pct = proc.memory_percent(PID).unwrap();
    assert!((pct - 2.5).abs() < 0.001, "got {}", pct);
}

#[test]
fn sampler_reports_cpu_since_previous_sample() {
    let (dir, proc) = procfs();
    let mut sampler = proc.sampler(PID).unwrap();

    // 100 process ticks over 1000 system ticks on 2 cpus
    write(&dir, &format!("{}/stat", PID), &pid_stat(180, 70));
    write(&dir, "stat", &system_stat(11_000));
    let usage = sampler.sample().unwrap();
    assert!((usage.cpu_usage - 20.0).abs() < 1e-9, "got {}", usage.cpu_usage);

    // idle interval
    write(&dir, "stat", &system_stat(12_000));
    assert_eq!(sampler.sample().unwrap().cpu_usage, 0.0);
}

#[test]
fn unchanged_clock_reports_zero_cpu() {
    let (_dir, proc) = procfs();
    let mut sampler = proc.sampler(PID).unwrap();
    assert_eq!(sampler.sample().unwrap().cpu_usage, 0.0);
}

#[test]
fn missing_process_is_a_read_error() {
    let (_dir, proc) = procfs();
    assert!(matches!(proc.sampler(1), Err(ResourceError::Read { .. })));
}

#[test]
fn missing_meminfo_total_is_a_parse_error() {
    let (dir, proc) = procfs();
    write(&dir, "meminfo", "MemFree: 1 kB\n");
    assert!(matches!(proc.memory_percent(PID), Err(ResourceError::Parse { .. })));
}
