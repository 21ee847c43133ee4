// SPDX-License-Identifier: MIT

//! Wires blueprint resolution and the agent runner behind
//! [`loom_flow::StepRunner`], the single capability the flow engine depends
//! on to actually invoke an agent for a step (spec §4.4, §4.7).

use std::sync::Arc;

use async_trait::async_trait;
use loom_blueprint::BlueprintLoader;
use loom_core::model::FlowStep;
use loom_flow::StepRunner;
use serde_json::Value;

use crate::agent_runner::AgentRunner;

/// Resolves a step's blueprint and hands it to the agent runner.
/// [`FlowStep::retry`], consumed once by `FlowEngine::run_step`, is the only
/// retry budget applied to a step; this runner makes exactly one call per
/// invocation so the engine's attempt count is never doubled. Whatever
/// transient-failure resilience the agent itself wants lives uniformly in
/// [`AgentRunner`] so the flow-step and direct-agent dispatch paths behave
/// identically.
pub struct RouterStepRunner<A: AgentRunner> {
    blueprints: Arc<BlueprintLoader>,
    agent_runner: Arc<A>,
}

impl<A: AgentRunner> RouterStepRunner<A> {
    pub fn new(blueprints: Arc<BlueprintLoader>, agent_runner: Arc<A>) -> Self {
        RouterStepRunner { blueprints, agent_runner }
    }
}

#[async_trait]
impl<A: AgentRunner> StepRunner for RouterStepRunner<A> {
    async fn run(&self, step: &FlowStep, input: Value) -> Result<Value, String> {
        let blueprint = self.blueprints.load(&step.agent).await.map_err(|e| e.to_string())?;
        self.agent_runner.run(&blueprint, &input).await
    }
}

#[cfg(test)]
#[path = "step_runner_tests.rs"]
mod tests;
