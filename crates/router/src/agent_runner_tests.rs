// SPDX-License-Identifier: MIT

use super::*;
use crate::provider::{GenerateOptions, MockProviderRegistry, ProviderRegistry};
use loom_core::model::Blueprint;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};

fn blueprint(model: Option<&str>) -> Blueprint {
    Blueprint::parse(
        "senior-coder",
        &format!(
            "---\nagent_id: senior-coder\n{}\n---\nYou write careful code.\n",
            model.map(|m| format!("model: {m}")).unwrap_or_default()
        ),
        "anthropic:default",
    )
    .unwrap()
}

#[tokio::test]
async fn run_sends_system_prompt_and_input_through_the_provider() {
    let runner = LlmAgentRunner::new(MockProviderRegistry);
    let bp = blueprint(None);
    let output = runner.run(&bp, &json!({"body": "do the thing"})).await.unwrap();
    let text = output.as_str().unwrap();
    assert!(text.starts_with("[mock:anthropic:default]"));
}

#[tokio::test]
async fn run_uses_the_blueprint_model_when_set() {
    let runner = LlmAgentRunner::new(MockProviderRegistry);
    let bp = blueprint(Some("openai:gpt-5"));
    let output = runner.run(&bp, &json!({})).await.unwrap();
    assert!(output.as_str().unwrap().starts_with("[mock:openai:gpt-5]"));
}

#[test]
fn prompt_for_includes_the_system_prompt_and_input() {
    let bp = blueprint(None);
    let prompt = LlmAgentRunner::<MockProviderRegistry>::prompt_for(&bp, &json!({"body": "x"}));
    assert!(prompt.starts_with(&bp.system_prompt));
    assert!(prompt.contains("Input:"));
}

struct FlakyProvider {
    calls: AtomicU32,
    fail_until: u32,
}

#[async_trait::async_trait]
impl ProviderRegistry for FlakyProvider {
    async fn generate(&self, _model: &str, _prompt: &str, _opts: GenerateOptions) -> Result<String, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call < self.fail_until {
            Err("rate limited, try again".to_string())
        } else {
            Ok("acknowledged".to_string())
        }
    }
}

#[tokio::test]
async fn run_retries_transient_provider_failures_until_success() {
    let provider = FlakyProvider { calls: AtomicU32::new(0), fail_until: 3 };
    let retry = loom_retry::RetryConfig { initial_delay_ms: 1, max_delay_ms: 1, ..Default::default() };
    let runner = LlmAgentRunner::with_retry(provider, retry);
    let bp = blueprint(None);

    let output = runner.run(&bp, &json!({})).await.unwrap();
    assert_eq!(output, json!("acknowledged"));
    assert_eq!(runner.provider.calls.load(Ordering::SeqCst), 3);
}
