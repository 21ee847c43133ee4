// SPDX-License-Identifier: MIT

use super::*;
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn succeeds_on_first_attempt_without_retries() {
    let policy = RetryPolicy::new(RetryConfig::default());
    let cancel = CancellationToken::new();
    let outcome = policy.execute(0.0, &cancel, None, |_| async { Ok::<_, String>(42) }).await;
    assert!(outcome.success);
    assert_eq!(outcome.value, Some(42));
    assert_eq!(outcome.total_attempts, 1);
    assert!(outcome.retry_history.is_empty());
}

#[tokio::test]
async fn retries_transient_errors_then_succeeds() {
    let policy = RetryPolicy::new(RetryConfig { initial_delay_ms: 1, max_delay_ms: 1, ..RetryConfig::default() });
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let outcome = policy
        .execute(0.0, &cancel, None, |_| {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("rate limit exceeded".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.value, Some(7));
    assert_eq!(outcome.total_attempts, 3);
    assert_eq!(outcome.retry_history.len(), 2);
}

#[tokio::test]
async fn non_retryable_error_fails_immediately() {
    let policy = RetryPolicy::new(RetryConfig::default());
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let outcome = policy
        .execute(0.0, &cancel, None, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("authentication failed".to_string())
            }
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.total_attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausts_retries_and_reports_final_error() {
    let policy = RetryPolicy::new(RetryConfig {
        max_retries: 2,
        initial_delay_ms: 1,
        max_delay_ms: 1,
        ..RetryConfig::default()
    });
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let outcome = policy
        .execute(0.0, &cancel, None, |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("HTTP 429".to_string())
            }
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.total_attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.error.as_deref(), Some("HTTP 429"));
}

#[tokio::test]
async fn cancellation_stops_further_attempts() {
    let policy = RetryPolicy::new(RetryConfig { initial_delay_ms: 50, max_delay_ms: 50, ..RetryConfig::default() });
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = policy.execute(0.0, &cancel, None, |_| async { Err::<(), _>("timeout".to_string()) }).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Operation aborted"));
}

#[tokio::test]
async fn temperature_escalates_per_retry_capped_at_max() {
    let policy = RetryPolicy::new(RetryConfig {
        initial_delay_ms: 1,
        max_delay_ms: 1,
        temperature_increment: 0.3,
        max_temperature: 0.5,
        ..RetryConfig::default()
    });
    let cancel = CancellationToken::new();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

    let _ = policy
        .execute(0.0, &cancel, None, |attempt| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(attempt.temperature);
                Err::<(), _>("timeout".to_string())
            }
        })
        .await;

    let recorded = seen.lock().unwrap().clone();
    assert_eq!(recorded[0], 0.0);
    assert!(recorded.windows(2).all(|w| w[1] >= w[0]));
    assert!(recorded.iter().all(|&t| t <= 0.5));
}

proptest! {
    #[test]
    fn retry_delay_is_non_decreasing_without_jitter(
        initial_delay_ms in 1u64..5000,
        multiplier in 1.0f64..4.0,
        max_delay_ms in 5000u64..60000,
    ) {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 6,
            initial_delay_ms,
            backoff_multiplier: multiplier,
            max_delay_ms,
            jitter_factor: 0.0,
            temperature_increment: 0.0,
            max_temperature: 0.0,
        });

        let mut prev = 0u64;
        for attempt in 1..=6u32 {
            let delay = policy.delay_for(attempt);
            prop_assert!(delay >= prev);
            prop_assert!(delay <= max_delay_ms);
            prev = delay;
        }
    }
}
