// SPDX-License-Identifier: MIT

//! Executes an approved Plan: dispatches its steps through the
//! [`RequestRouter`] (sequentially, or as a single flow when the plan opts
//! in) and registers the resulting changeset (spec §4.8).

use std::sync::Arc;

use chrono::Utc;
use loom_core::model::{Changeset, Plan, PlanParseError, Request, RequestStatus};
use loom_journal::Journal;
use serde_json::json;
use uuid::Uuid;

use crate::agent_runner::AgentRunner;
use crate::changeset::ChangesetRegistrar;
use crate::router::RequestRouter;

#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("plan failed to parse: {0}")]
    Parse(#[from] PlanParseError),
    #[error("step {0} failed: {1}")]
    StepFailed(u32, String),
    #[error("changeset registration failed: {0}")]
    Registration(String),
}

pub struct PlanExecutor<A: AgentRunner, C: ChangesetRegistrar> {
    router: Arc<RequestRouter<A>>,
    journal: Arc<Journal>,
    changesets: Arc<C>,
    portal: String,
}

impl<A: AgentRunner, C: ChangesetRegistrar> PlanExecutor<A, C> {
    pub fn new(router: Arc<RequestRouter<A>>, journal: Arc<Journal>, changesets: Arc<C>, portal: impl Into<String>) -> Self {
        PlanExecutor { router, journal, changesets, portal: portal.into() }
    }

    pub async fn execute(&self, plan_content: &str, request_id: &str) -> Result<Changeset, ExecuteError> {
        let plan = match Plan::parse(plan_content) {
            Ok(plan) => plan,
            Err(error) => {
                self.journal_parse_failure(request_id, &error).await;
                return Err(error.into());
            }
        };

        if plan.non_sequential {
            tracing::warn!(trace_id = %plan.trace_id, "plan has non-contiguous step numbers; executing in sorted order");
        }

        let default_agent = plan.agent.clone().unwrap_or_default();

        if plan.wants_flow() {
            let synthetic = Self::synthetic_request(&plan, &default_agent, plan.flow.clone(), &Self::combined_body(&plan));
            let outcome = self.router.route(&synthetic).await;
            if !outcome.routed {
                return Err(ExecuteError::StepFailed(0, outcome.reason.unwrap_or_else(|| "flow routing rejected".to_string())));
            }
        } else {
            for step in &plan.steps {
                let synthetic = Self::synthetic_request(&plan, &default_agent, None, &step.content);
                let outcome = self.router.route(&synthetic).await;
                if !outcome.routed {
                    return Err(ExecuteError::StepFailed(step.number, outcome.reason.unwrap_or_default()));
                }
                if let Some(reason) = outcome.reason {
                    return Err(ExecuteError::StepFailed(step.number, reason));
                }
            }
        }

        let description = format!("plan {} ({} steps)", request_id, plan.steps.len());
        let mut changeset = Changeset::new(plan.trace_id, self.portal.clone(), format!("loom/{request_id}"), description, "loom-daemon", Utc::now());

        match self.changesets.register(&changeset).await {
            Ok(commit_sha) => {
                changeset.approve(commit_sha, plan.steps.len() as u32, Utc::now());
                Ok(changeset)
            }
            Err(error) => Err(ExecuteError::Registration(error)),
        }
    }

    fn combined_body(plan: &Plan) -> String {
        plan.steps
            .iter()
            .map(|s| format!("## Step {}: {}\n{}", s.number, s.title, s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn synthetic_request(plan: &Plan, default_agent: &str, flow: Option<String>, body: &str) -> Request {
        Request {
            trace_id: plan.trace_id,
            agent_id: default_agent.to_string(),
            status: RequestStatus::InProgress,
            priority: 5,
            created_at: Some(Utc::now()),
            tags: Vec::new(),
            skills: Vec::new(),
            skip_skills: Vec::new(),
            flow,
            model: plan.model.clone(),
            body: body.to_string(),
        }
    }

    async fn journal_parse_failure(&self, request_id: &str, error: &PlanParseError) {
        let payload = json!({ "request_id": request_id, "reason": error.to_string() });
        if let Err(journal_error) =
            self.journal.log("executor", "plan.parsing_failed", request_id, payload, None::<Uuid>).await
        {
            tracing::warn!(error = %journal_error, "failed to journal plan parse failure");
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
