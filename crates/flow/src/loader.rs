// SPDX-License-Identifier: MIT

//! Loads flow definitions from `<flows_root>/<flow_id>.yaml` (spec §4, Flow
//! component: "FlowLoader + DependencyResolver").

use std::path::PathBuf;

use loom_core::model::{Flow, FlowOutput, FlowStep, FlowValidationError, InputSource, StepRetry};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowLoadError {
    #[error("failed to read flow `{0}`: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("flow `{0}` is not valid YAML: {1}")]
    Yaml(String, #[source] serde_yaml::Error),
    #[error("flow `{0}` step `{1}` has an invalid input directive `{2}` (expected `request`, `aggregate`, or `step:<id>`)")]
    InvalidInputDirective(String, String, String),
    #[error(transparent)]
    Validation(#[from] FlowValidationError),
}

#[derive(Debug, Deserialize)]
struct RawRetry {
    max_attempts: u32,
    backoff_ms: u64,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    from: String,
    format: String,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    id: String,
    name: String,
    agent: String,
    #[serde(default)]
    depends_on: Vec<String>,
    input: String,
    transform: Option<String>,
    retry: Option<RawRetry>,
    timeout_ms: Option<u64>,
    condition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFlow {
    id: String,
    steps: Vec<RawStep>,
    max_parallelism: u32,
    #[serde(default)]
    fail_fast: bool,
    timeout_ms: Option<u64>,
    output: RawOutput,
}

pub struct FlowLoader {
    root: PathBuf,
}

impl FlowLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FlowLoader { root: root.into() }
    }

    pub async fn load(&self, flow_id: &str) -> Result<Flow, FlowLoadError> {
        let path = self.root.join(format!("{flow_id}.yaml"));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FlowLoadError::Io(flow_id.to_string(), e))?;
        Self::parse(flow_id, &content)
    }

    fn parse(flow_id: &str, content: &str) -> Result<Flow, FlowLoadError> {
        let raw: RawFlow =
            serde_yaml::from_str(content).map_err(|e| FlowLoadError::Yaml(flow_id.to_string(), e))?;

        let mut steps = Vec::with_capacity(raw.steps.len());
        for raw_step in raw.steps {
            let input = InputSource::parse(&raw_step.input).ok_or_else(|| {
                FlowLoadError::InvalidInputDirective(raw.id.clone(), raw_step.id.clone(), raw_step.input.clone())
            })?;
            steps.push(FlowStep {
                id: raw_step.id,
                name: raw_step.name,
                agent: raw_step.agent,
                depends_on: raw_step.depends_on,
                input,
                transform: raw_step.transform,
                retry: raw_step.retry.map(|r| StepRetry { max_attempts: r.max_attempts, backoff_ms: r.backoff_ms }),
                timeout_ms: raw_step.timeout_ms,
                condition: raw_step.condition,
            });
        }

        let flow = Flow {
            id: raw.id,
            steps,
            max_parallelism: raw.max_parallelism,
            fail_fast: raw.fail_fast,
            timeout_ms: raw.timeout_ms,
            output: FlowOutput { from: raw.output.from, format: raw.output.format },
        };

        flow.validate()?;
        Ok(flow)
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
