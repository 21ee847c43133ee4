// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to load config: {0}")]
    Config(#[from] crate::config_loader::ConfigLoadError),
    #[error("failed to create directory {0}: {1}")]
    CreateDir(PathBuf, #[source] std::io::Error),
    #[error("another loomd instance already holds the lock at {0}")]
    AlreadyRunning(PathBuf),
    #[error("failed to acquire lock at {0}: {1}")]
    Lock(PathBuf, #[source] std::io::Error),
    #[error("failed to open journal: {0}")]
    Journal(#[from] loom_journal::JournalError),
    #[error("failed to start file watcher: {0}")]
    Watcher(#[from] loom_watcher::WatcherError),
}
