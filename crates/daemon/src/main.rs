// SPDX-License-Identifier: MIT

//! `loomd`: the daemon binary. Resolves the workspace root, loads
//! configuration, starts the watchers and router pipeline, then waits for
//! SIGINT/SIGTERM to shut down gracefully (spec §6 Signals: "SIGINT and
//! SIGTERM trigger graceful shutdown ... Fatal startup errors exit with
//! code 1").

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loomd", about = "Local agent orchestration daemon")]
struct Cli {
    /// Workspace root to watch. Defaults to the current directory, or
    /// `LOOM_ROOT` when set.
    #[arg(long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let root = cli
        .root
        .or_else(loom_daemon::env::root_override)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = match loom_daemon::load_config(&root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("loomd: failed to load config: {error}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config);

    let mut daemon = match loom_daemon::Daemon::start(config).await {
        Ok(daemon) => daemon,
        Err(error) => {
            tracing::error!(%error, "loomd failed to start");
            std::process::exit(1);
        }
    };

    tracing::info!("loomd running, waiting for SIGINT/SIGTERM");

    // The signal listener only flips the cancellation flag; it never races
    // `daemon.run()` itself in a `select!`, since the losing branch of a
    // `select!` is dropped the instant the other resolves — that would
    // truncate an in-flight flow step mid-call instead of letting it observe
    // cancellation and unwind. `run` is awaited to completion below and
    // exits on its own once the token fires.
    let cancel = daemon.cancel_handle();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(error) => {
                tracing::error!(%error, "failed to install SIGINT handler");
                std::process::exit(1);
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::process::exit(1);
            }
        };

        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => tracing::info!("received SIGINT"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            }
            cancel.cancel();
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received ctrl-c");
            cancel.cancel();
        });
    }

    daemon.run().await;
    daemon.shutdown().await;
    tracing::info!("loomd shutdown complete");
}

/// Set up a global tracing subscriber writing to `<root>/System/daemon.log`,
/// filterable via `LOOM_LOG`/`RUST_LOG` (falls back to `config.system.log_level`).
fn init_logging(config: &loom_core::Config) -> tracing_appender::non_blocking::WorkerGuard {
    let parent = config.daemon_log_path().parent().map(|p| p.to_path_buf()).unwrap_or_default();
    let _ = std::fs::create_dir_all(&parent);

    let file_appender = tracing_appender::rolling::never(
        parent,
        config.daemon_log_path().file_name().unwrap_or_default(),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.system.log_level.clone()));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(non_blocking).with_ansi(false).init();

    guard
}
