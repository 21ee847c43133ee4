// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! loom-retry: exponential backoff with jitter, temperature escalation, and
//! retryable-error classification (spec §4.2).

mod classify;

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

pub use classify::is_retryable;

/// Tuning knobs for a [`RetryPolicy`]. Default profile matches spec §4.2:
/// `3/1000/2/30000/0/0/0`.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
    pub temperature_increment: f64,
    pub max_temperature: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            jitter_factor: 0.0,
            temperature_increment: 0.0,
            max_temperature: 0.0,
        }
    }
}

/// One attempt's context, handed to the operation closure.
#[derive(Debug, Clone, Copy)]
pub struct Attempt {
    pub attempt: u32,
    pub temperature: f64,
}

/// A single retry's bookkeeping, returned in [`RetryOutcome::retry_history`].
#[derive(Debug, Clone)]
pub struct RetryRecord {
    pub attempt: u32,
    pub error: String,
    pub delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RetryOutcome<T> {
    pub success: bool,
    pub value: Option<T>,
    pub error: Option<String>,
    pub total_attempts: u32,
    pub retry_history: Vec<RetryRecord>,
}

/// Called before each delay between attempts.
pub trait OnRetry: Fn(Attempt, &str, u64) + Send + Sync {}
impl<F: Fn(Attempt, &str, u64) + Send + Sync> OnRetry for F {}

pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        RetryPolicy { config }
    }

    /// Run `op` to completion, retrying transient failures per the
    /// configured backoff/jitter/temperature-escalation schedule.
    ///
    /// `op` receives the current [`Attempt`] and returns `Result<T, String>`;
    /// the error string is classified via [`is_retryable`].
    pub async fn execute<T, F, Fut>(
        &self,
        base_temperature: f64,
        cancel: &CancellationToken,
        on_retry: Option<&(dyn OnRetry)>,
        mut op: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let mut history = Vec::new();
        let mut temperature = base_temperature;

        for attempt in 1..=(self.config.max_retries + 1) {
            if cancel.is_cancelled() {
                return RetryOutcome {
                    success: false,
                    value: None,
                    error: Some("Operation aborted".to_string()),
                    total_attempts: attempt.saturating_sub(1),
                    retry_history: history,
                };
            }

            match op(Attempt { attempt, temperature }).await {
                Ok(value) => {
                    return RetryOutcome {
                        success: true,
                        value: Some(value),
                        error: None,
                        total_attempts: attempt,
                        retry_history: history,
                    }
                }
                Err(error) => {
                    let retryable = is_retryable(&error);
                    let exhausted = attempt > self.config.max_retries;
                    if !retryable || exhausted {
                        return RetryOutcome {
                            success: false,
                            value: None,
                            error: Some(error),
                            total_attempts: attempt,
                            retry_history: history,
                        };
                    }

                    let delay = self.delay_for(attempt);
                    history.push(RetryRecord { attempt, error: error.clone(), delay_ms: delay });
                    if let Some(cb) = on_retry {
                        cb(Attempt { attempt, temperature }, &error, delay);
                    }
                    temperature = (temperature + self.config.temperature_increment)
                        .min(self.config.max_temperature.max(temperature));

                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                        _ = cancel.cancelled() => {
                            return RetryOutcome {
                                success: false,
                                value: None,
                                error: Some("Operation aborted".to_string()),
                                total_attempts: attempt,
                                retry_history: history,
                            };
                        }
                    }
                }
            }
        }

        unreachable!("loop always returns by its last iteration")
    }

    /// `min(maxDelayMs, initialDelayMs * multiplier^(attempt-1))` with
    /// multiplicative jitter in `[1 - jitterFactor/2, 1 + jitterFactor/2]`.
    fn delay_for(&self, attempt: u32) -> u64 {
        let base = self.config.initial_delay_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);
        let capped = base.min(self.config.max_delay_ms as f64);

        let jitter = if self.config.jitter_factor > 0.0 {
            let half = self.config.jitter_factor / 2.0;
            rand::thread_rng().gen_range((1.0 - half)..=(1.0 + half))
        } else {
            1.0
        };

        (capped * jitter).round().max(0.0) as u64
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
