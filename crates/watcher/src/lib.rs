// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-watcher: debounced, stability-verified directory watching (spec §4.5).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use loom_core::WatcherConfig;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Stability-check backoff schedule (spec §4.5): five attempts, growing delay
/// between the two stat samples.
const BACKOFF_MS: [u64; 5] = [50, 100, 200, 500, 1000];

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to initialize directory watch on {0}: {1}")]
    Init(PathBuf, #[source] notify::Error),
}

/// A file whose content has been read after passing stability verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReady {
    pub path: PathBuf,
    pub content: String,
}

struct WatchState {
    generations: Mutex<HashMap<PathBuf, u64>>,
    processing: Mutex<HashSet<PathBuf>>,
}

/// Watches one directory (non-recursive) for created/modified `.md` files,
/// debouncing bursts of events and verifying size stability before a path is
/// reported ready. Construct with [`FileWatcher::start`]; read emitted
/// [`FileReady`] values from the returned receiver.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    shutdown: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl FileWatcher {
    /// Start watching `root`. `suffix_filter`, when set, restricts candidate
    /// files to those whose name ends with the given suffix (used by the
    /// plan watcher, which only picks up `*_plan.md`); `None` accepts every
    /// non-dotfile `.md` file (used by the request watcher).
    pub fn start(
        root: impl Into<PathBuf>,
        config: WatcherConfig,
        suffix_filter: Option<String>,
    ) -> Result<(Self, mpsc::Receiver<FileReady>), WatcherError> {
        let root = root.into();
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    for path in event.paths {
                        let _ = raw_tx.send(path);
                    }
                }
            }
        })
        .map_err(|e| WatcherError::Init(root.clone(), e))?;
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::Init(root.clone(), e))?;

        let (ready_tx, ready_rx) = mpsc::channel(256);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let state = Arc::new(WatchState { generations: Mutex::new(HashMap::new()), processing: Mutex::new(HashSet::new()) });

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    maybe_path = raw_rx.recv() => {
                        match maybe_path {
                            Some(path) => {
                                if !is_candidate(&path, suffix_filter.as_deref()) {
                                    continue;
                                }
                                let generation = {
                                    let mut generations = state.generations.lock();
                                    let entry = generations.entry(path.clone()).or_insert(0);
                                    *entry += 1;
                                    *entry
                                };
                                tokio::spawn(debounce_then_verify(
                                    path,
                                    generation,
                                    config,
                                    state.clone(),
                                    ready_tx.clone(),
                                ));
                            }
                            None => break,
                        }
                    }
                }
            }
        });

        Ok((FileWatcher { _watcher: watcher, shutdown: Some(shutdown_tx), task }, ready_rx))
    }

    /// Cancel the watch loop. Clears pending timers and, after this resolves,
    /// no further callbacks fire.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = self.task.await;
    }
}

fn is_candidate(path: &Path, suffix_filter: Option<&str>) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else { return false };
    if name.starts_with('.') || !name.ends_with(".md") {
        return false;
    }
    match suffix_filter {
        Some(suffix) => name.ends_with(suffix),
        None => true,
    }
}

async fn debounce_then_verify(
    path: PathBuf,
    generation: u64,
    config: WatcherConfig,
    state: Arc<WatchState>,
    ready_tx: mpsc::Sender<FileReady>,
) {
    tokio::time::sleep(Duration::from_millis(config.debounce_ms)).await;

    let current = state.generations.lock().get(&path).copied().unwrap_or(0);
    if current != generation {
        return; // a later event superseded this one; let its own timer run
    }

    {
        let mut processing = state.processing.lock();
        if !processing.insert(path.clone()) {
            return; // already being verified
        }
    }

    if config.stability_check {
        verify_and_emit(&path, ready_tx).await;
    } else {
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let _ = ready_tx.send(FileReady { path: path.clone(), content }).await;
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "watcher.file_unstable: read failed");
            }
        }
    }
    state.processing.lock().remove(&path);
}

async fn verify_and_emit(path: &Path, ready_tx: mpsc::Sender<FileReady>) {
    for &backoff in &BACKOFF_MS {
        let Ok(first) = tokio::fs::metadata(path).await else {
            tracing::debug!(path = %path.display(), "watcher.file_unstable: stat failed, retrying");
            continue;
        };
        tokio::time::sleep(Duration::from_millis(backoff)).await;
        let Ok(second) = tokio::fs::metadata(path).await else {
            continue;
        };

        if first.len() != 0 && first.len() == second.len() {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let _ = ready_tx.send(FileReady { path: path.to_path_buf(), content }).await;
                    return;
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "watcher.file_unstable: read failed after stable stat");
                    return;
                }
            }
        }
    }

    tracing::warn!(path = %path.display(), "watcher.file_unstable: size never stabilized, dropping");
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
