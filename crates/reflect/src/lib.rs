// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! loom-reflect: wraps tool invocations with an LLM-judged success verdict
//! and optional retry-with-alternative-parameters (spec §4.3).

mod metrics;
mod traits;
mod types;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use futures::future::join_all;

pub use metrics::{Metrics, MetricsSnapshot};
pub use traits::{AlwaysSucceedsJudge, Judge, LlmJudge, ToolExecutor, VerdictGenerator};
pub use types::{ExecutionResult, Issue, IssueSeverity, IssueType, ReflectedResult, ToolCall, Verdict};

pub struct ToolReflector<E: ToolExecutor, J: Judge> {
    executor: E,
    judge: J,
    max_retries: u32,
    metrics: Metrics,
}

impl<E: ToolExecutor, J: Judge> ToolReflector<E, J> {
    pub fn new(executor: E, judge: J, max_retries: u32) -> Self {
        ToolReflector { executor, judge, max_retries, metrics: Metrics::default() }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Execute one call, re-executing with `alternative_parameters` when the
    /// judge suggests a retry, bounded by `max_retries` (spec §4.3).
    pub async fn execute_one(&self, call: ToolCall) -> ReflectedResult {
        let mut call = call;
        let mut attempts = 0u32;
        let mut retries = 0u32;

        loop {
            attempts += 1;
            let started = Instant::now();
            let mut execution = self.executor.execute(&call).await;
            if execution.duration_ms == 0 {
                execution.duration_ms = started.elapsed().as_millis() as u64;
            }

            let verdict = self.judge.judge(&call, &execution).await;
            let success = verdict.effective_success();

            let should_retry = verdict.retry_suggested && retries < self.max_retries;
            if !should_retry {
                self.metrics.record(&call.name, success, retries);
                return ReflectedResult { call_id: call.id, success, execution, verdict, attempts };
            }

            if let Some(alt) = verdict.alternative_parameters.clone() {
                merge_parameters(&mut call.parameters, alt);
            }
            retries += 1;
        }
    }

    /// Run `calls` respecting the partial order induced by `dependencies`;
    /// independent calls run concurrently (spec §4.3). A call whose
    /// dependency did not succeed is skipped and recorded as a failure.
    pub async fn execute_many(&self, calls: Vec<ToolCall>) -> Vec<ReflectedResult> {
        let layers = match layer_by_dependencies(&calls) {
            Some(layers) => layers,
            None => {
                tracing::warn!("tool call dependency graph has a cycle; running sequentially by input order");
                vec![calls.iter().map(|c| c.id.clone()).collect()]
            }
        };

        let by_id: HashMap<&str, &ToolCall> = calls.iter().map(|c| (c.id.as_str(), c)).collect();
        let mut results: HashMap<String, ReflectedResult> = HashMap::new();

        for layer in layers {
            let runnable: Vec<&ToolCall> = layer
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).copied())
                .collect();

            let futures = runnable.iter().map(|call| {
                let blocked = call.dependencies.iter().any(|dep| {
                    results.get(dep).map(|r| !r.success).unwrap_or(false)
                });
                let call = (*call).clone();
                async move {
                    if blocked {
                        ReflectedResult {
                            call_id: call.id,
                            success: false,
                            execution: ExecutionResult {
                                success: false,
                                output: serde_json::Value::Null,
                                error: Some("skipped: upstream dependency failed".to_string()),
                                duration_ms: 0,
                            },
                            verdict: Verdict {
                                success: false,
                                confidence: 0,
                                achieved_purpose: false,
                                issues: Vec::new(),
                                retry_suggested: false,
                                retry_reason: None,
                                alternative_parameters: None,
                                insights: None,
                            },
                            attempts: 0,
                        }
                    } else {
                        self.execute_one(call).await
                    }
                }
            });

            for result in join_all(futures).await {
                results.insert(result.call_id.clone(), result);
            }
        }

        calls.iter().filter_map(|c| results.remove(&c.id)).collect()
    }
}

fn merge_parameters(original: &mut serde_json::Value, alternative: serde_json::Value) {
    match (original, alternative) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                base.insert(key, value);
            }
        }
        (slot, alternative) => *slot = alternative,
    }
}

/// Kahn's algorithm over `ToolCall::dependencies`. Returns `None` on a cycle.
fn layer_by_dependencies(calls: &[ToolCall]) -> Option<Vec<Vec<String>>> {
    let ids: HashSet<&str> = calls.iter().map(|c| c.id.as_str()).collect();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for call in calls {
        in_degree.entry(call.id.as_str()).or_insert(0);
        for dep in &call.dependencies {
            if !ids.contains(dep.as_str()) {
                continue;
            }
            *in_degree.entry(call.id.as_str()).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(call.id.as_str());
        }
    }

    let mut layer_of: HashMap<&str, usize> = HashMap::new();
    let mut frontier: Vec<&str> = in_degree.iter().filter(|(_, d)| **d == 0).map(|(id, _)| *id).collect();
    let mut degree = in_degree.clone();
    let mut visited = 0usize;

    let mut layer = 0usize;
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for id in &frontier {
            layer_of.insert(id, layer);
            visited += 1;
            if let Some(deps) = dependents.get(id) {
                for &dependent in deps {
                    if let Some(d) = degree.get_mut(dependent) {
                        *d -= 1;
                        if *d == 0 {
                            next.push(dependent);
                        }
                    }
                }
            }
        }
        frontier = next;
        layer += 1;
    }

    if visited != calls.len() {
        return None;
    }

    let max_layer = layer_of.values().copied().max().unwrap_or(0);
    let mut layers = vec![Vec::new(); max_layer + 1];
    for call in calls {
        layers[layer_of[call.id.as_str()]].push(call.id.clone());
    }
    Some(layers)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
