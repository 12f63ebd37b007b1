// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for the admin binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the file writer flushing until dropped.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`;
/// with `log_dir` set, output is also written to a daily rolling file.
pub fn init(default_filter: &str, log_dir: Option<&Path>, file_prefix: &str) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer().with_writer(writer).with_ansi(false);
            let _ = tracing_subscriber::registry().with(filter).with(stderr).with(file).try_init();
            LogGuard { _file: Some(guard) }
        }
        None => {
            let _ = tracing_subscriber::registry().with(filter).with(stderr).try_init();
            LogGuard { _file: None }
        }
    }
}
