// SPDX-License-Identifier: MIT

//! Invokes an agent's blueprint against a provider (spec §4.7, §6).

use async_trait::async_trait;
use loom_core::model::Blueprint;
use loom_retry::{RetryConfig, RetryPolicy};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::provider::{GenerateOptions, ProviderRegistry};

/// Invokes one agent's blueprint with a structured input, returning its
/// structured output. Implemented by `loom-router` over an [`ProviderRegistry`]
/// so that `loom-flow`'s [`loom_flow::StepRunner`] and the direct-agent
/// dispatch path in [`crate::router::RequestRouter`] share one capability —
/// including whatever transient-failure resilience it applies, so neither
/// dispatch path gets more or less retry than the other.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, blueprint: &Blueprint, input: &Value) -> Result<Value, String>;
}

pub struct LlmAgentRunner<R: ProviderRegistry> {
    provider: R,
    retry: RetryPolicy,
}

impl<R: ProviderRegistry> LlmAgentRunner<R> {
    pub fn new(provider: R) -> Self {
        Self::with_retry(provider, RetryConfig::default())
    }

    pub fn with_retry(provider: R, retry_config: RetryConfig) -> Self {
        LlmAgentRunner { provider, retry: RetryPolicy::new(retry_config) }
    }

    fn prompt_for(blueprint: &Blueprint, input: &Value) -> String {
        format!("{}\n\n---\nInput:\n{}", blueprint.system_prompt, input)
    }
}

#[async_trait]
impl<R: ProviderRegistry> AgentRunner for LlmAgentRunner<R> {
    async fn run(&self, blueprint: &Blueprint, input: &Value) -> Result<Value, String> {
        let model = blueprint.model.as_deref().unwrap_or("anthropic:claude-sonnet");
        let prompt = Self::prompt_for(blueprint, input);
        let cancel = CancellationToken::new();

        let outcome = self
            .retry
            .execute(0.0, &cancel, None, |_attempt| {
                let prompt = prompt.clone();
                async move { self.provider.generate(model, &prompt, GenerateOptions::default()).await }
            })
            .await;

        outcome
            .value
            .map(Value::String)
            .ok_or_else(|| outcome.error.unwrap_or_else(|| "agent invocation failed".to_string()))
    }
}

#[cfg(test)]
#[path = "agent_runner_tests.rs"]
mod tests;
