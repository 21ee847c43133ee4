// SPDX-License-Identifier: MIT

//! Daemon process wiring: directory/lock setup, the two file watchers, and
//! the pipeline that turns `FileReady` events into routed work (spec §2 data
//! flow, §6 Signals).

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use loom_blueprint::BlueprintLoader;
use loom_core::model::{Plan, Request};
use loom_core::Config;
use loom_flow::{FlowEngine, FlowLoader, TransformRegistry};
use loom_journal::Journal;
use loom_router::{
    LlmAgentRunner, MockProviderRegistry, NullChangesetRegistrar, PlanExecutor, ProcessError,
    RequestProcessor, RequestRouter, RouterStepRunner,
};
use loom_watcher::{FileReady, FileWatcher};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::DaemonError;

/// The agent runner this binary wires up. A real deployment supplies its own
/// `ProviderRegistry` in place of [`MockProviderRegistry`] (the concrete LLM
/// wire format is out of scope here, spec §1).
type DefaultAgentRunner = LlmAgentRunner<MockProviderRegistry>;

/// A running daemon: owns the lock file, the journal, and both watchers.
/// Dropping it releases the lock but does not flush the journal — call
/// [`Daemon::shutdown`] for a graceful stop.
pub struct Daemon {
    config: Arc<Config>,
    journal: Arc<Journal>,
    router: Arc<RequestRouter<DefaultAgentRunner>>,
    processor: Arc<RequestProcessor<MockProviderRegistry>>,
    executor: Arc<PlanExecutor<DefaultAgentRunner, NullChangesetRegistrar>>,
    requests_watcher: FileWatcher,
    requests_rx: mpsc::Receiver<FileReady>,
    active_watcher: FileWatcher,
    active_rx: mpsc::Receiver<FileReady>,
    cancel: CancellationToken,
    _lock_file: File,
}

impl Daemon {
    pub async fn start(config: Config) -> Result<Self, DaemonError> {
        let config = Arc::new(config);

        for dir in [
            config.inbox_requests(),
            config.inbox_plans(),
            config.active_plans(),
            config.blueprints_dir(),
            config.flows_dir(),
            config.memory_dir(),
            config.system_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| DaemonError::CreateDir(dir, e))?;
        }

        let lock_file = acquire_lock(&config.lock_path())?;

        let cancel = CancellationToken::new();

        let journal = Arc::new(Journal::open(&config.journal_path(), Duration::from_millis(50)).await?);
        let blueprints = Arc::new(BlueprintLoader::new(config.blueprints_dir(), config.agents.default_model.clone()));
        let flow_loader = Arc::new(FlowLoader::new(config.flows_dir()));
        let agent_runner = Arc::new(LlmAgentRunner::new(MockProviderRegistry));

        let step_runner = Arc::new(RouterStepRunner::new(blueprints.clone(), agent_runner.clone()));
        let flow_engine = Arc::new(FlowEngine::new(TransformRegistry::new(), step_runner));

        let router = Arc::new(RequestRouter::new(
            blueprints,
            flow_loader,
            flow_engine,
            agent_runner,
            journal.clone(),
            config.agents.default_agent_id.clone(),
            cancel.clone(),
        ));

        let processor = Arc::new(RequestProcessor::new(
            MockProviderRegistry,
            journal.clone(),
            config.inbox_plans(),
            config.agents.default_model.clone(),
        ));

        let executor = Arc::new(PlanExecutor::new(
            router.clone(),
            journal.clone(),
            Arc::new(NullChangesetRegistrar),
            "loom-daemon",
        ));

        let (requests_watcher, requests_rx) =
            FileWatcher::start(config.inbox_requests(), config.watcher, None)?;
        let (active_watcher, active_rx) =
            FileWatcher::start(config.active_plans(), config.watcher, Some("_plan.md".to_string()))?;

        tracing::info!(root = %config.root().display(), "loomd started");

        Ok(Daemon {
            config,
            journal,
            router,
            processor,
            executor,
            requests_watcher,
            requests_rx,
            active_watcher,
            active_rx,
            cancel,
            _lock_file: lock_file,
        })
    }

    /// A clone of the daemon's cancellation token. The caller holds this
    /// separately from `&mut self` so a signal handler can call `.cancel()`
    /// on it concurrently with [`Daemon::run`] awaiting to completion,
    /// rather than racing `run`'s future itself in a `select!` and dropping
    /// whatever it was doing mid-step.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the daemon until its cancellation token fires (see
    /// [`Daemon::cancel_handle`]) or both watchers close. On cancellation,
    /// any flow run in progress observes the same token inside
    /// `FlowEngine::run_once` and unwinds its in-flight step before this
    /// loop exits.
    pub async fn run(&mut self) {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::info!("shutdown requested, draining in-flight work");
                    break;
                }
                ready = self.requests_rx.recv() => {
                    match ready {
                        Some(event) => self.handle_request_ready(event).await,
                        None => break,
                    }
                }
                ready = self.active_rx.recv() => {
                    match ready {
                        Some(event) => self.handle_plan_ready(event).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn handle_request_ready(&self, event: FileReady) {
        let request_id = request_id_from_path(&event.path);
        let request = match Request::parse(&event.content) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(path = %event.path.display(), %error, "failed to parse request document");
                self.log("watcher", "file.invalid", &request_id, json!({"reason": error.to_string()}), None)
                    .await;
                return;
            }
        };

        self.log("watcher", "file.detected", &request_id, json!({"path": event.path.display().to_string()}), Some(request.trace_id))
            .await;

        match self.processor.process(&request, &request_id).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "staged plan for request {request_id}");
            }
            Err(ProcessError::Generation(reason)) => {
                tracing::warn!(%reason, "plan generation failed for request {request_id}");
            }
            Err(ProcessError::Write(path, error)) => {
                tracing::warn!(%error, path = %path.display(), "failed to stage plan document");
            }
        }
    }

    async fn handle_plan_ready(&self, event: FileReady) {
        let request_id = request_id_from_path(&event.path).trim_end_matches("_plan").to_string();

        match Plan::parse(&event.content) {
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(path = %event.path.display(), %error, "plan failed to parse");
            }
        }

        match self.executor.execute(&event.content, &request_id).await {
            Ok(changeset) => {
                tracing::info!(changeset_id = %changeset.id, "plan {request_id} executed to a registered changeset");
            }
            Err(error) => {
                tracing::warn!(%error, "plan {request_id} execution failed");
            }
        }
    }

    async fn log(
        &self,
        actor: &str,
        action_type: &str,
        target: &str,
        payload: serde_json::Value,
        trace_id: Option<uuid::Uuid>,
    ) {
        if let Err(error) = self.journal.log(actor, action_type, target, payload, trace_id).await {
            tracing::warn!(%error, "failed to journal {action_type}");
        }
    }

    /// Stop both watchers and flush the journal (spec §6: "stop watchers →
    /// cancel flows → flush journal → exit 0"). Cancelling here is
    /// idempotent with whatever already cancelled `self.cancel` to stop
    /// `run`'s loop, so this is safe to call unconditionally before the
    /// watchers and journal are torn down.
    pub async fn shutdown(self) {
        tracing::info!("loomd shutting down");
        self.cancel.cancel();
        self.requests_watcher.stop().await;
        self.active_watcher.stop().await;
        if let Err(error) = self.journal.wait_for_flush().await {
            tracing::warn!(%error, "failed to flush journal on shutdown");
        }
        let _ = self.journal.close().await;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn acquire_lock(lock_path: &PathBuf) -> Result<File, DaemonError> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| DaemonError::Lock(lock_path.clone(), e))?;

    file.try_lock_exclusive().map_err(|_| DaemonError::AlreadyRunning(lock_path.clone()))?;

    file.set_len(0).map_err(|e| DaemonError::Lock(lock_path.clone(), e))?;
    writeln!(file, "{}", std::process::id()).map_err(|e| DaemonError::Lock(lock_path.clone(), e))?;
    Ok(file)
}

fn request_id_from_path(path: &std::path::Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown").to_string()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
