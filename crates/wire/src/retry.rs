// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side retry for transient RPC failures.

use std::future::Future;
use std::time::Duration;

use tonic::{Code, Status};

/// Retry budget for unary calls.
///
/// The first attempt runs without a deadline; each retry is bounded by
/// `per_retry_timeout` and preceded by an exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub per_retry_timeout: Duration,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            per_retry_timeout: Duration::from_millis(150),
            base_backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn is_retryable(code: Code) -> bool {
        matches!(code, Code::NotFound | Code::Unavailable | Code::Aborted)
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }

    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T, Status>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let mut last = match op().await {
            Ok(value) => return Ok(value),
            Err(status) => status,
        };

        for attempt in 1..=self.max_retries {
            if !Self::is_retryable(last.code()) {
                break;
            }
            tokio::time::sleep(self.backoff(attempt)).await;
            tracing::debug!(attempt, code = ?last.code(), "retrying rpc");
            last = match tokio::time::timeout(self.per_retry_timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(status)) => status,
                // A timed-out retry counts as unavailable and may be retried again
                Err(_) => Status::unavailable("retry attempt timed out"),
            };
        }
        Err(last)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
