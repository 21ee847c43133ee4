// SPDX-License-Identifier: MIT

//! Batched background writer: flushes on N events or T milliseconds,
//! whichever comes first (spec §4.1).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loom_core::model::JournalEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::store::Store;

const MAX_BATCH: usize = 200;

pub(crate) enum WriterMsg {
    Event(JournalEvent),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Shared failure counter for logging errors the caller must never observe
/// directly (spec §4.1: "failures are counted and re-emitted as a
/// rate-limited warning event").
#[derive(Default)]
pub struct FailureCounter(AtomicU64);

impl FailureCounter {
    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

pub(crate) fn spawn(
    mut store: Store,
    mut rx: mpsc::Receiver<WriterMsg>,
    batch_interval: Duration,
    failures: Arc<FailureCounter>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buffer: Vec<JournalEvent> = Vec::with_capacity(MAX_BATCH);
        let mut deadline = Instant::now() + batch_interval;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(WriterMsg::Event(mut event)) => {
                            buffer.push({
                                event.seq = next_seq();
                                event
                            });
                            if buffer.len() >= MAX_BATCH {
                                flush(&mut store, &mut buffer, &failures);
                                deadline = Instant::now() + batch_interval;
                            }
                        }
                        Some(WriterMsg::Flush(ack)) => {
                            flush(&mut store, &mut buffer, &failures);
                            let _ = ack.send(());
                        }
                        Some(WriterMsg::Shutdown(ack)) => {
                            flush(&mut store, &mut buffer, &failures);
                            let _ = ack.send(());
                            return;
                        }
                        None => {
                            flush(&mut store, &mut buffer, &failures);
                            return;
                        }
                    }
                }
                _ = tokio::time::sleep(timeout) => {
                    flush(&mut store, &mut buffer, &failures);
                    deadline = Instant::now() + batch_interval;
                }
            }
        }
    })
}

fn flush(store: &mut Store, buffer: &mut Vec<JournalEvent>, failures: &Arc<FailureCounter>) {
    if buffer.is_empty() {
        return;
    }
    if let Err(error) = store.append_batch(buffer) {
        failures.bump();
        tracing::warn!(%error, count = failures.count(), "journal flush failed, events dropped");
    }
    buffer.clear();
}

static SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    SEQ.fetch_add(1, Ordering::Relaxed)
}
