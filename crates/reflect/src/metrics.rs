// SPDX-License-Identifier: MIT

//! Aggregate metrics retained across reflector invocations (spec §4.3).

use std::collections::HashMap;

use parking_lot::Mutex;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_retries: u64,
    pub retry_rate: f64,
    pub per_tool: HashMap<String, u64>,
}

#[derive(Default)]
pub struct Metrics {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    total_calls: u64,
    successes: u64,
    failures: u64,
    total_retries: u64,
    per_tool: HashMap<String, u64>,
}

impl Metrics {
    pub fn record(&self, tool_name: &str, success: bool, retries: u32) {
        let mut inner = self.inner.lock();
        inner.total_calls += 1;
        if success {
            inner.successes += 1;
        } else {
            inner.failures += 1;
        }
        inner.total_retries += retries as u64;
        *inner.per_tool.entry(tool_name.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock();
        let retry_rate = if inner.total_calls == 0 { 0.0 } else { inner.total_retries as f64 / inner.total_calls as f64 };
        MetricsSnapshot {
            total_calls: inner.total_calls,
            successes: inner.successes,
            failures: inner.failures,
            total_retries: inner.total_retries,
            retry_rate,
            per_tool: inner.per_tool.clone(),
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
