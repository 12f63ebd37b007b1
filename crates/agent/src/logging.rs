// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for the agent binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::env::{DEBUG_LOG_FILTER, DEFAULT_LOG_FILTER};

/// Flushes the file writer when dropped.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Filter applied when `RUST_LOG` is unset.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        DEBUG_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Install the global subscriber. Output goes to stderr and, with
/// `log_dir`, to a daily rolling `<file_prefix>` file as well.
pub fn init(debug: bool, log_dir: Option<&Path>, file_prefix: &str) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(debug);

    let Some(dir) = log_dir else {
        let _ = tracing_subscriber::registry().with(filter).with(stderr).try_init();
        return LogGuard { _file: None };
    };
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_prefix));
    let file = fmt::layer().with_writer(writer).with_ansi(false);
    let _ = tracing_subscriber::registry().with(filter).with(stderr).with(file).try_init();
    LogGuard { _file: Some(guard) }
}
