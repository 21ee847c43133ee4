// SPDX-License-Identifier: MIT

//! Executes a flow DAG (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::{self, join_all, Either};
use loom_core::model::{Flow, FlowStep, InputSource, StepResult, StepResultStatus};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::condition;
use crate::transform::TransformRegistry;

/// Invokes one flow step's agent. Supplied by the caller (`loom-router`
/// wires blueprint resolution, retry, and reflection behind this single
/// capability) so the engine itself stays free of agent-invocation details.
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run(&self, step: &FlowStep, input: Value) -> Result<Value, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRunStatus {
    Completed,
    Failed,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct FlowRunOutcome {
    pub status: FlowRunStatus,
    pub step_results: Vec<StepResult>,
    pub final_output: Option<Value>,
    pub reason: Option<String>,
}

pub struct FlowEngine {
    transforms: TransformRegistry,
    runner: Arc<dyn StepRunner>,
}

impl FlowEngine {
    pub fn new(transforms: TransformRegistry, runner: Arc<dyn StepRunner>) -> Self {
        FlowEngine { transforms, runner }
    }

    pub async fn run(&self, flow: &Flow, request: Value, cancel: CancellationToken) -> FlowRunOutcome {
        if let Err(error) = flow.validate() {
            return FlowRunOutcome {
                status: FlowRunStatus::Invalid,
                step_results: Vec::new(),
                final_output: None,
                reason: Some(error.to_string()),
            };
        }

        let Some(layers) = flow.layers() else {
            return FlowRunOutcome {
                status: FlowRunStatus::Invalid,
                step_results: Vec::new(),
                final_output: None,
                reason: Some(format!("flow `{}` contains a dependency cycle", flow.id)),
            };
        };

        let by_id: HashMap<&str, &FlowStep> = flow.steps.iter().map(|s| (s.id.as_str(), s)).collect();
        let semaphore = Arc::new(Semaphore::new(flow.max_parallelism.max(1) as usize));

        let mut statuses: HashMap<String, StepResultStatus> = HashMap::new();
        let mut outputs: HashMap<String, Value> = HashMap::new();
        let mut step_results: Vec<StepResult> = Vec::new();
        let mut fail_fast_triggered = false;

        for layer in layers {
            let mut tasks = Vec::new();

            for step_id in &layer {
                let step = by_id[step_id.as_str()];

                if cancel.is_cancelled() || fail_fast_triggered || Self::blocked_by_dependency(step, &statuses) {
                    step_results.push(StepResult::skipped(step_id.clone()));
                    statuses.insert(step_id.clone(), StepResultStatus::Skipped);
                    continue;
                }

                if let Some(condition) = &step.condition {
                    match condition::evaluate(condition, &statuses) {
                        Ok(true) => {}
                        Ok(false) => {
                            step_results.push(StepResult::skipped(step_id.clone()));
                            statuses.insert(step_id.clone(), StepResultStatus::Skipped);
                            continue;
                        }
                        Err(error) => {
                            let result = StepResult::failed(step_id.clone(), error.to_string(), 0);
                            statuses.insert(step_id.clone(), StepResultStatus::Failed);
                            step_results.push(result);
                            continue;
                        }
                    }
                }

                let input = self.source_input(step, &request, &outputs, flow);
                tasks.push(self.run_step(step, input, semaphore.clone(), cancel.clone()));
            }

            for result in join_all(tasks).await {
                statuses.insert(result.step_id.clone(), result.status);
                if let Some(output) = &result.output {
                    outputs.insert(result.step_id.clone(), output.clone());
                }
                if flow.fail_fast && result.status == StepResultStatus::Failed {
                    fail_fast_triggered = true;
                }
                step_results.push(result);
            }
        }

        let final_output = outputs.get(&flow.output.from).cloned();
        let status = if step_results.iter().any(|r| r.status == StepResultStatus::Failed) {
            FlowRunStatus::Failed
        } else {
            FlowRunStatus::Completed
        };

        FlowRunOutcome { status, step_results, final_output, reason: None }
    }

    fn blocked_by_dependency(step: &FlowStep, statuses: &HashMap<String, StepResultStatus>) -> bool {
        step.depends_on.iter().any(|dep| {
            matches!(statuses.get(dep), Some(StepResultStatus::Failed) | Some(StepResultStatus::Skipped))
        })
    }

    fn source_input(
        &self,
        step: &FlowStep,
        request: &Value,
        outputs: &HashMap<String, Value>,
        flow: &Flow,
    ) -> Value {
        let raw = match &step.input {
            InputSource::Request => request.clone(),
            InputSource::Step { id } => outputs.get(id).cloned().unwrap_or(Value::Null),
            InputSource::Aggregate => {
                let mut map = serde_json::Map::new();
                for dep in &step.depends_on {
                    if let Some(output) = outputs.get(dep) {
                        map.insert(dep.clone(), output.clone());
                    }
                }
                let _ = flow;
                Value::Object(map)
            }
        };
        self.transforms.apply(step.transform.as_deref(), raw)
    }

    async fn run_step(
        &self,
        step: &FlowStep,
        input: Value,
        semaphore: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> StepResult {
        let _permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return StepResult::failed(step.id.clone(), "scheduling semaphore closed", 0),
        };
        let started = Instant::now();

        let max_attempts = step.retry.map(|r| r.max_attempts).unwrap_or(1).max(1);
        let backoff = step.retry.map(|r| Duration::from_millis(r.backoff_ms)).unwrap_or_default();

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            let outcome = self.run_once(step, input.clone(), &cancel).await;
            match outcome {
                StepAttempt::Completed(value) => {
                    return StepResult::completed(step.id.clone(), value, started.elapsed().as_millis() as u64);
                }
                StepAttempt::Cancelled => {
                    return StepResult::failed(step.id.clone(), "cancelled by shutdown", started.elapsed().as_millis() as u64);
                }
                StepAttempt::Failed(error) | StepAttempt::TimedOut(error) => {
                    last_error = error;
                    if attempt < max_attempts && !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        StepResult::failed(step.id.clone(), last_error, started.elapsed().as_millis() as u64)
    }

    async fn run_once(&self, step: &FlowStep, input: Value, cancel: &CancellationToken) -> StepAttempt {
        let runner = self.runner.clone();
        let step_owned = step.clone();
        let mut handle = tokio::spawn(async move { runner.run(&step_owned, input).await });

        let deadline = match step.timeout_ms {
            Some(ms) => Either::Left(tokio::time::sleep(Duration::from_millis(ms))),
            None => Either::Right(future::pending()),
        };
        tokio::pin!(deadline);

        tokio::select! {
            result = &mut handle => match result {
                Ok(Ok(value)) => StepAttempt::Completed(value),
                Ok(Err(error)) => StepAttempt::Failed(error),
                Err(_join_error) => StepAttempt::Failed("step task panicked".to_string()),
            },
            () = &mut deadline => {
                handle.abort();
                StepAttempt::TimedOut("step timed out".to_string())
            },
            () = cancel.cancelled() => {
                handle.abort();
                StepAttempt::Cancelled
            },
        }
    }
}

enum StepAttempt {
    Completed(Value),
    Failed(String),
    TimedOut(String),
    Cancelled,
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
