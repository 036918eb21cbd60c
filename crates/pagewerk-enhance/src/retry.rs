// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded retries for correction-service calls.
//
// Every attempt runs under its own timeout; a timeout counts as a failed
// attempt. Retries are spaced by a fixed delay. Any error returned by the
// call is retried; a provider cannot mark a failure as final.

use std::future::Future;
use std::time::Duration;

use pagewerk_core::EnhanceConfig;
use pagewerk_core::error::{PagewerkError, Result};
use tracing::warn;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Bound on each individual attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &EnhanceConfig) -> Self {
        Self {
            max_retries: config.max_service_retries,
            delay: config.retry_delay(),
            attempt_timeout: config.correction_timeout(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Maximum retries exhausted.
    Exhausted,
}

/// Decide whether to retry after attempt number `attempt` (zero-based) failed.
pub fn should_retry(attempt: u32, config: &RetryConfig) -> RetryDecision {
    if attempt >= config.max_retries {
        RetryDecision::Exhausted
    } else {
        RetryDecision::RetryAfter(config.delay)
    }
}

/// What a retried call produced, and how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

/// Run `operation` until it succeeds or runs out of attempts.
///
/// `operation` receives the zero-based attempt number. An attempt exceeding
/// `attempt_timeout` is dropped and reported as `ServiceTimeout`.
pub async fn retry_with_timeout<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        let result = match tokio::time::timeout(config.attempt_timeout, operation(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(PagewerkError::ServiceTimeout(config.attempt_timeout.as_secs())),
        };

        let err = match result {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                };
            }
            Err(err) => err,
        };

        match should_retry(attempt, config) {
            RetryDecision::RetryAfter(delay) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts(),
                    error_kind = err.kind(),
                    error = %err,
                    "correction attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            RetryDecision::Exhausted => {
                warn!(attempts = attempt + 1, error = %err, "retry limit exhausted");
                return RetryOutcome {
                    result: Err(err),
                    attempts: attempt + 1,
                };
            }
        }
    }
}
