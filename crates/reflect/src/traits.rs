// SPDX-License-Identifier: MIT

//! Capability interfaces the reflector depends on (spec §9: "model as an
//! explicit capability interface with two named implementations").

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{ExecutionResult, ToolCall, Verdict};

/// Runs a tool call against its real backing system.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> ExecutionResult;
}

/// Judges whether an execution actually achieved the call's stated purpose.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, call: &ToolCall, result: &ExecutionResult) -> Verdict;
}

/// A `Judge` that always reports success with high confidence and no
/// retry, for tests and for daemons run without an LLM judge configured.
pub struct AlwaysSucceedsJudge;

#[async_trait]
impl Judge for AlwaysSucceedsJudge {
    async fn judge(&self, _call: &ToolCall, result: &ExecutionResult) -> Verdict {
        Verdict {
            success: result.success,
            confidence: if result.success { 100 } else { 0 },
            achieved_purpose: result.success,
            issues: Vec::new(),
            retry_suggested: false,
            retry_reason: None,
            alternative_parameters: None,
            insights: None,
        }
    }
}

/// A `Judge` backed by an LLM-style `generate(prompt) -> text` capability,
/// parsing its structured JSON verdict (spec §4.3, §6: "the core sees a
/// single `generate(prompt, opts) -> text` capability").
#[async_trait]
pub trait VerdictGenerator: Send + Sync {
    async fn generate_verdict(&self, prompt: String) -> Result<Value, String>;
}

pub struct LlmJudge<G: VerdictGenerator> {
    generator: G,
}

impl<G: VerdictGenerator> LlmJudge<G> {
    pub fn new(generator: G) -> Self {
        LlmJudge { generator }
    }

    fn prompt_for(call: &ToolCall, result: &ExecutionResult) -> String {
        format!(
            "Tool `{}` was invoked to achieve: {}\nParameters: {}\nResult success={} output={} error={:?}\nRespond with a structured verdict.",
            call.name, call.purpose, call.parameters, result.success, result.output, result.error
        )
    }
}

#[async_trait]
impl<G: VerdictGenerator> Judge for LlmJudge<G> {
    async fn judge(&self, call: &ToolCall, result: &ExecutionResult) -> Verdict {
        let prompt = Self::prompt_for(call, result);
        match self.generator.generate_verdict(prompt).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_else(|_| fallback_verdict(result)),
            Err(_) => fallback_verdict(result),
        }
    }
}

fn fallback_verdict(result: &ExecutionResult) -> Verdict {
    Verdict {
        success: result.success,
        confidence: 0,
        achieved_purpose: false,
        issues: Vec::new(),
        retry_suggested: false,
        retry_reason: Some("judge unavailable or returned an unparsable verdict".to_string()),
        alternative_parameters: None,
        insights: None,
    }
}
