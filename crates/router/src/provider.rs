// SPDX-License-Identifier: MIT

//! LLM provider capability (spec §6: "the core sees a single
//! `generate(prompt, opts) -> text` capability"; providers are keyed by
//! `provider:model` strings).

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f64>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;
    async fn generate(&self, prompt: &str, opts: GenerateOptions) -> Result<String, String>;
}

/// Looks a provider up by its `provider:model` identifier.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str, opts: GenerateOptions) -> Result<String, String>;
}

/// A deterministic provider registry for daemons run without a real LLM
/// configured (and for tests): every `generate` call echoes a canned
/// response derived from the prompt.
#[derive(Debug, Clone, Default)]
pub struct MockProviderRegistry;

#[async_trait]
impl ProviderRegistry for MockProviderRegistry {
    async fn generate(&self, model: &str, prompt: &str, _opts: GenerateOptions) -> Result<String, String> {
        Ok(format!("[mock:{model}] acknowledged {} bytes of input", prompt.len()))
    }
}
