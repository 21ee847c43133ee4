// SPDX-License-Identifier: MIT

use super::*;
use async_trait::async_trait;
use loom_blueprint::BlueprintLoader;
use loom_core::model::{Blueprint, ChangesetStatus};
use loom_flow::{FlowEngine, FlowLoader, StepRunner, TransformRegistry};
use loom_journal::Journal;
use serde_json::Value;
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct EchoAgentRunner;

#[async_trait]
impl AgentRunner for EchoAgentRunner {
    async fn run(&self, blueprint: &Blueprint, _input: &Value) -> Result<Value, String> {
        Ok(serde_json::json!({"agent": blueprint.agent_id}))
    }
}

struct FailingAgentRunner;

#[async_trait]
impl AgentRunner for FailingAgentRunner {
    async fn run(&self, _blueprint: &Blueprint, _input: &Value) -> Result<Value, String> {
        Err("agent exploded".to_string())
    }
}

struct CompletingStepRunner;

#[async_trait]
impl StepRunner for CompletingStepRunner {
    async fn run(&self, _step: &loom_core::model::FlowStep, _input: Value) -> Result<Value, String> {
        Ok(serde_json::json!("done"))
    }
}

async fn setup<A: AgentRunner>(
    blueprints_dir: &std::path::Path,
    flows_dir: &std::path::Path,
    journal_dir: &std::path::Path,
    agent_runner: A,
) -> (Arc<RequestRouter<A>>, Arc<Journal>) {
    let blueprints = Arc::new(BlueprintLoader::new(blueprints_dir, "anthropic:default"));
    let flow_loader = Arc::new(FlowLoader::new(flows_dir));
    let flow_engine = Arc::new(FlowEngine::new(TransformRegistry::new(), Arc::new(CompletingStepRunner)));
    let journal = Arc::new(Journal::open(&journal_dir.join("journal.db"), Duration::from_millis(10)).await.unwrap());
    let router = Arc::new(RequestRouter::new(
        blueprints,
        flow_loader,
        flow_engine,
        Arc::new(agent_runner),
        journal.clone(),
        "senior-coder",
        CancellationToken::new(),
    ));
    (router, journal)
}

fn sequential_plan(trace_id: Uuid) -> String {
    format!(
        "---\ntrace_id: {trace_id}\nrequest_id: req-1\nagent: senior-coder\n---\n## Step 1: Do the first thing\nFirst.\n\n## Step 2: Do the second thing\nSecond.\n"
    )
}

fn flow_plan(trace_id: Uuid) -> String {
    format!(
        "---\ntrace_id: {trace_id}\nrequest_id: req-1\nagent: senior-coder\nflow: demo\n---\n## Step 1: Whole plan\nDo everything.\n"
    )
}

#[tokio::test]
async fn execute_runs_each_step_sequentially_and_registers_a_changeset() {
    let blueprints_dir = tempdir().unwrap();
    let flows_dir = tempdir().unwrap();
    let journal_dir = tempdir().unwrap();
    tokio::fs::write(blueprints_dir.path().join("senior-coder.md"), "---\nagent_id: senior-coder\n---\nBody.\n")
        .await
        .unwrap();

    let (router, journal) = setup(blueprints_dir.path(), flows_dir.path(), journal_dir.path(), EchoAgentRunner).await;
    let executor = PlanExecutor::new(router, journal, Arc::new(NullChangesetRegistrar), "acme/portal");

    let trace_id = Uuid::new_v4();
    let changeset = executor.execute(&sequential_plan(trace_id), "req-1").await.unwrap();

    assert_eq!(changeset.status, ChangesetStatus::Approved);
    assert_eq!(changeset.trace_id, trace_id);
    assert!(changeset.commit_sha.is_some());
}

#[tokio::test]
async fn execute_runs_a_flow_scoped_plan_as_a_single_flow_request() {
    let blueprints_dir = tempdir().unwrap();
    let flows_dir = tempdir().unwrap();
    let journal_dir = tempdir().unwrap();
    tokio::fs::write(
        flows_dir.path().join("demo.yaml"),
        "id: demo\nmax_parallelism: 1\nsteps:\n  - id: s1\n    name: Step One\n    agent: senior-coder\n    input: request\noutput:\n  from: s1\n  format: json\n",
    )
    .await
    .unwrap();

    let (router, journal) = setup(blueprints_dir.path(), flows_dir.path(), journal_dir.path(), EchoAgentRunner).await;
    let executor = PlanExecutor::new(router, journal, Arc::new(NullChangesetRegistrar), "acme/portal");

    let trace_id = Uuid::new_v4();
    let changeset = executor.execute(&flow_plan(trace_id), "req-1").await.unwrap();

    assert_eq!(changeset.status, ChangesetStatus::Approved);
}

#[tokio::test]
async fn execute_stops_on_the_first_failing_step_and_does_not_register_a_changeset() {
    let blueprints_dir = tempdir().unwrap();
    let flows_dir = tempdir().unwrap();
    let journal_dir = tempdir().unwrap();
    tokio::fs::write(blueprints_dir.path().join("senior-coder.md"), "---\nagent_id: senior-coder\n---\nBody.\n")
        .await
        .unwrap();

    let (router, journal) =
        setup(blueprints_dir.path(), flows_dir.path(), journal_dir.path(), FailingAgentRunner).await;
    let executor = PlanExecutor::new(router, journal, Arc::new(NullChangesetRegistrar), "acme/portal");

    let trace_id = Uuid::new_v4();
    let result = executor.execute(&sequential_plan(trace_id), "req-1").await;
    assert!(matches!(result, Err(ExecuteError::StepFailed(1, _))));
}

#[tokio::test]
async fn malformed_plan_is_rejected_without_routing_anything() {
    let blueprints_dir = tempdir().unwrap();
    let flows_dir = tempdir().unwrap();
    let journal_dir = tempdir().unwrap();

    let (router, journal) = setup(blueprints_dir.path(), flows_dir.path(), journal_dir.path(), EchoAgentRunner).await;
    let executor = PlanExecutor::new(router, journal, Arc::new(NullChangesetRegistrar), "acme/portal");

    let result = executor.execute("not a plan document", "req-bad").await;
    assert!(matches!(result, Err(ExecuteError::Parse(_))));
}
