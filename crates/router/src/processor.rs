// SPDX-License-Identifier: MIT

//! Turns an approved [`Request`] into a staged Plan document (spec §2
//! "RequestProcessor", §3.1, §4.8).

use std::path::PathBuf;
use std::sync::Arc;

use loom_core::model::Request;
use loom_journal::Journal;
use serde_json::json;
use uuid::Uuid;

use crate::provider::{GenerateOptions, ProviderRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("plan generation failed: {0}")]
    Generation(String),
    #[error("failed to write plan to {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Generates and stages a Plan document for a Request, via a single LLM
/// call that produces the numbered step body.
pub struct RequestProcessor<R: ProviderRegistry> {
    provider: R,
    journal: Arc<Journal>,
    plans_staging: PathBuf,
    planning_model: String,
}

impl<R: ProviderRegistry> RequestProcessor<R> {
    pub fn new(
        provider: R,
        journal: Arc<Journal>,
        plans_staging: impl Into<PathBuf>,
        planning_model: impl Into<String>,
    ) -> Self {
        RequestProcessor {
            provider,
            journal,
            plans_staging: plans_staging.into(),
            planning_model: planning_model.into(),
        }
    }

    /// Produce a Plan document for `request` and write it under the staging
    /// directory as `<request_id>_plan.md`. Returns the written path.
    pub async fn process(&self, request: &Request, request_id: &str) -> Result<PathBuf, ProcessError> {
        let prompt = Self::planning_prompt(request);
        let body = self
            .provider
            .generate(&self.planning_model, &prompt, GenerateOptions::default())
            .await
            .map_err(ProcessError::Generation)?;

        let document = render_plan_document(request.trace_id, request_id, &request.agent_id, &body);
        let path = self.plans_staging.join(format!("{request_id}_plan.md"));
        tokio::fs::write(&path, &document).await.map_err(|e| ProcessError::Write(path.clone(), e))?;

        let payload = json!({ "request_id": request_id, "path": path.display().to_string() });
        if let Err(error) = self.journal.log("processor", "plan.generated", request_id, payload, Some(request.trace_id)).await {
            tracing::warn!(%error, "failed to journal plan generation");
        }

        Ok(path)
    }

    fn planning_prompt(request: &Request) -> String {
        format!(
            "Break the following request into a sequence of numbered steps, each formatted exactly as\n`## Step N: <title>` followed by its content.\n\nRequest:\n{}",
            request.body
        )
    }
}

fn render_plan_document(trace_id: Uuid, request_id: &str, agent_id: &str, body: &str) -> String {
    format!(
        "---\ntrace_id: {trace_id}\nrequest_id: {request_id}\nagent: {agent_id}\n---\n{}",
        body.trim()
    )
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;

