// SPDX-License-Identifier: MIT

//! Flow definitions: a DAG of steps used by the flow engine (spec §3.1, §4.4).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Where a step's input is sourced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSource {
    Request,
    Step { id: String },
    Aggregate,
}

impl InputSource {
    /// Parse the document-level directive form: `request`, `step:<id>`, or
    /// `aggregate`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "request" {
            Some(InputSource::Request)
        } else if raw == "aggregate" {
            Some(InputSource::Aggregate)
        } else {
            raw.strip_prefix("step:").map(|id| InputSource::Step { id: id.to_string() })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRetry {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

/// A single node in a [`Flow`]'s DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub id: String,
    pub name: String,
    pub agent: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub input: InputSource,
    #[serde(default)]
    pub transform: Option<String>,
    pub retry: Option<StepRetry>,
    pub timeout_ms: Option<u64>,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowOutput {
    pub from: String,
    pub format: String,
}

/// A named DAG of steps (spec §3.1, §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub steps: Vec<FlowStep>,
    pub max_parallelism: u32,
    #[serde(default)]
    pub fail_fast: bool,
    pub timeout_ms: Option<u64>,
    pub output: FlowOutput,
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowValidationError {
    #[error("flow `{0}` has no steps")]
    NoSteps(String),
    #[error("flow `{0}` step `{1}` depends on unknown step `{2}`")]
    UnknownDependency(String, String, String),
    #[error("flow `{0}` contains a cycle in its step dependencies")]
    Cycle(String),
    #[error("flow `{0}` output references unknown step `{1}`")]
    UnknownOutputStep(String, String),
    #[error("flow `{0}` declares duplicate step id `{1}`")]
    DuplicateStepId(String, String),
}

impl Flow {
    /// Validate structural soundness: no duplicate ids, dependencies resolve,
    /// no cycles, output references a declared step.
    pub fn validate(&self) -> Result<(), FlowValidationError> {
        if self.steps.is_empty() {
            return Err(FlowValidationError::NoSteps(self.id.clone()));
        }

        let mut ids = HashSet::new();
        for step in &self.steps {
            if !ids.insert(step.id.as_str()) {
                return Err(FlowValidationError::DuplicateStepId(self.id.clone(), step.id.clone()));
            }
        }

        for step in &self.steps {
            for dep in &step.depends_on {
                if !ids.contains(dep.as_str()) {
                    return Err(FlowValidationError::UnknownDependency(
                        self.id.clone(),
                        step.id.clone(),
                        dep.clone(),
                    ));
                }
            }
        }

        if !ids.contains(self.output.from.as_str()) {
            return Err(FlowValidationError::UnknownOutputStep(self.id.clone(), self.output.from.clone()));
        }

        self.topological_order().map(|_| ()).ok_or_else(|| FlowValidationError::Cycle(self.id.clone()))
    }

    /// Kahn's algorithm; returns `None` on a cycle.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for step in &self.steps {
            in_degree.entry(step.id.as_str()).or_insert(0);
            for dep in &step.depends_on {
                *in_degree.entry(step.id.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(step.id.as_str());
            }
        }

        let mut ready: Vec<&str> =
            in_degree.iter().filter(|(_, deg)| **deg == 0).map(|(id, _)| *id).collect();
        ready.sort_unstable();

        let mut order = Vec::with_capacity(self.steps.len());
        while let Some(id) = ready.pop() {
            order.push(id.to_string());
            if let Some(deps) = dependents.get(id) {
                for &dependent in deps {
                    if let Some(deg) = in_degree.get_mut(dependent) {
                        *deg -= 1;
                        if *deg == 0 {
                            ready.push(dependent);
                        }
                    }
                }
            }
            ready.sort_unstable();
        }

        if order.len() == self.steps.len() {
            Some(order)
        } else {
            None
        }
    }

    /// Steps grouped by earliest-possible-start layer, for layered parallel
    /// scheduling (spec §4.4).
    pub fn layers(&self) -> Option<Vec<Vec<String>>> {
        self.topological_order()?;

        let by_id: HashMap<&str, &FlowStep> = self.steps.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut layer_of: HashMap<&str, usize> = HashMap::new();
        let order = self.topological_order()?;

        for id in &order {
            let step = by_id[id.as_str()];
            let layer = step
                .depends_on
                .iter()
                .map(|dep| layer_of.get(dep.as_str()).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            layer_of.insert(id.as_str(), layer);
        }

        let max_layer = layer_of.values().copied().max().unwrap_or(0);
        let mut layers = vec![Vec::new(); max_layer + 1];
        for id in &order {
            layers[layer_of[id.as_str()]].push(id.clone());
        }
        Some(layers)
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
