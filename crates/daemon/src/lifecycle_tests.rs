// SPDX-License-Identifier: MIT

use super::*;
use loom_core::{Config, PathsConfig, SystemConfig, WatcherConfig};
use serial_test::serial;
use std::time::Duration;
use tempfile::tempdir;
use uuid::Uuid;

fn fast_config(root: &std::path::Path) -> Config {
    Config {
        system: SystemConfig { root: root.to_path_buf(), log_level: "info".to_string() },
        paths: PathsConfig::default(),
        watcher: WatcherConfig { debounce_ms: 5, stability_check: false },
        agents: Default::default(),
    }
}

async fn write_blueprint(config: &Config) {
    std::fs::create_dir_all(config.blueprints_dir()).unwrap();
    std::fs::write(
        config.blueprints_dir().join("default-agent.md"),
        "---\nname: Default\nversion: 1\n---\nYou are the default agent.\n",
    )
    .unwrap();
}

#[tokio::test]
#[serial]
async fn start_creates_every_required_directory() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let daemon = Daemon::start(config.clone()).await.unwrap();

    for path in [
        config.inbox_requests(),
        config.inbox_plans(),
        config.active_plans(),
        config.blueprints_dir(),
        config.flows_dir(),
        config.memory_dir(),
        config.system_dir(),
    ] {
        assert!(path.is_dir(), "{path:?} was not created");
    }

    daemon.shutdown().await;
}

#[tokio::test]
#[serial]
async fn a_second_daemon_cannot_start_against_the_same_root() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let first = Daemon::start(config.clone()).await.unwrap();

    let second = Daemon::start(config.clone()).await;
    assert!(matches!(second, Err(DaemonError::AlreadyRunning(_))));

    first.shutdown().await;
}

#[tokio::test]
#[serial]
async fn dropping_a_request_file_produces_a_staged_plan() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    write_blueprint(&config).await;
    let mut daemon = Daemon::start(config.clone()).await.unwrap();

    let trace_id = Uuid::new_v4();
    let request_path = config.inbox_requests().join("req-1.md");
    std::fs::write(
        &request_path,
        format!(
            "---\ntrace_id: {trace_id}\nagent_id: default-agent\npriority: 5\n---\nInvestigate the failing build.\n"
        ),
    )
    .unwrap();

    let run = tokio::spawn(async move {
        daemon.run().await;
        daemon
    });

    let plan_path = config.inbox_plans().join("req-1_plan.md");
    let mut waited = Duration::ZERO;
    while !plan_path.exists() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }

    assert!(plan_path.exists(), "no plan was staged for the dropped request");
    let staged = std::fs::read_to_string(&plan_path).unwrap();
    assert!(staged.contains(&trace_id.to_string()));

    run.abort();
}

#[tokio::test]
#[serial]
async fn cancelling_the_handle_stops_run_gracefully() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let mut daemon = Daemon::start(config.clone()).await.unwrap();
    let cancel = daemon.cancel_handle();

    let run = tokio::spawn(async move {
        daemon.run().await;
        daemon
    });

    cancel.cancel();
    let daemon = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not return after cancellation")
        .unwrap();

    daemon.shutdown().await;
}

#[tokio::test]
#[serial]
async fn an_unparseable_request_file_is_logged_and_does_not_stage_a_plan() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    write_blueprint(&config).await;
    let mut daemon = Daemon::start(config.clone()).await.unwrap();

    std::fs::write(config.inbox_requests().join("bad.md"), "not a request document at all\n").unwrap();

    let run = tokio::spawn(async move {
        daemon.run().await;
        daemon
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!config.inbox_plans().join("bad_plan.md").exists());

    run.abort();
}
