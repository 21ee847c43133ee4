// SPDX-License-Identifier: MIT

//! Decides whether a [`Request`] dispatches to the flow engine or directly
//! to a single agent, and journals the decision (spec §4.7).

use std::sync::Arc;

use loom_blueprint::BlueprintLoader;
use loom_core::model::Request;
use loom_flow::{FlowEngine, FlowLoader, FlowRunOutcome};
use loom_journal::Journal;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::agent_runner::AgentRunner;

/// The outcome of one routing decision. `routed = false` means the request
/// was rejected before anything ran (bad flow reference, unknown blueprint);
/// `routed = true` means a flow or agent was invoked, independent of whether
/// that invocation itself succeeded (see `flow_outcome` / `agent_output`).
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub routed: bool,
    pub reason: Option<String>,
    pub flow_outcome: Option<FlowRunOutcome>,
    pub agent_output: Option<Value>,
}

pub struct RequestRouter<A: AgentRunner> {
    blueprints: Arc<BlueprintLoader>,
    flow_loader: Arc<FlowLoader>,
    flow_engine: Arc<FlowEngine>,
    agent_runner: Arc<A>,
    journal: Arc<Journal>,
    default_agent_id: String,
    cancel: CancellationToken,
}

impl<A: AgentRunner> RequestRouter<A> {
    /// `cancel` is shared with the daemon's lifecycle: cancelling it stops
    /// any flow run this router starts instead of each call racing its own,
    /// unreachable token (spec §5 Cancellation).
    pub fn new(
        blueprints: Arc<BlueprintLoader>,
        flow_loader: Arc<FlowLoader>,
        flow_engine: Arc<FlowEngine>,
        agent_runner: Arc<A>,
        journal: Arc<Journal>,
        default_agent_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        RequestRouter {
            blueprints,
            flow_loader,
            flow_engine,
            agent_runner,
            journal,
            default_agent_id: default_agent_id.into(),
            cancel,
        }
    }

    pub async fn route(&self, request: &Request) -> RouteOutcome {
        if let Some(flow_id) = request.flow.as_deref() {
            return self.route_to_flow(request, flow_id).await;
        }
        self.route_to_agent(request).await
    }

    async fn route_to_flow(&self, request: &Request, flow_id: &str) -> RouteOutcome {
        let flow = match self.flow_loader.load(flow_id).await {
            Ok(flow) => flow,
            Err(error) => {
                let reason = error.to_string();
                self.journal_decision(request, "request.routed.invalid", &reason).await;
                return RouteOutcome { routed: false, reason: Some(reason), flow_outcome: None, agent_output: None };
            }
        };

        self.journal_decision(request, "request.routed.flow", flow_id).await;
        let input = json!({ "trace_id": request.trace_id, "body": request.body });
        let outcome = self.flow_engine.run(&flow, input, self.cancel.clone()).await;
        RouteOutcome { routed: true, reason: None, flow_outcome: Some(outcome), agent_output: None }
    }

    async fn route_to_agent(&self, request: &Request) -> RouteOutcome {
        let agent_id =
            if request.agent_id.is_empty() { self.default_agent_id.as_str() } else { request.agent_id.as_str() };

        let blueprint = match self.blueprints.load(agent_id).await {
            Ok(blueprint) => blueprint,
            Err(error) => {
                let reason = error.to_string();
                self.journal_decision(request, "request.routed.invalid", &reason).await;
                return RouteOutcome { routed: false, reason: Some(reason), flow_outcome: None, agent_output: None };
            }
        };

        self.journal_decision(request, "request.routed.agent", agent_id).await;
        let input = json!({ "trace_id": request.trace_id, "body": request.body });
        match self.agent_runner.run(&blueprint, &input).await {
            Ok(output) => {
                RouteOutcome { routed: true, reason: None, flow_outcome: None, agent_output: Some(output) }
            }
            Err(error) => RouteOutcome { routed: true, reason: Some(error), flow_outcome: None, agent_output: None },
        }
    }

    async fn journal_decision(&self, request: &Request, action_type: &str, detail: &str) {
        let payload = json!({ "agent_id": request.agent_id, "flow": request.flow, "detail": detail });
        if let Err(error) = self.journal.log("router", action_type, detail, payload, Some(request.trace_id)).await {
            tracing::warn!(%error, trace_id = %request.trace_id, "failed to journal routing decision");
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
