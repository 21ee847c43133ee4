// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! loom-journal: the durable, append-only activity log (spec §4.1).
//!
//! Writes are batched in a single background task and flushed on N events
//! or T milliseconds, whichever comes first. The store underneath is opened
//! with SQLite's write-ahead log so readers never block on the writer.

mod error;
mod store;
mod writer;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use loom_core::model::{JournalEvent, NotificationKind, NotificationRow};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

pub use error::JournalError;
pub use writer::FailureCounter;

use store::Store;
use writer::WriterMsg;

const CHANNEL_CAPACITY: usize = 1024;

/// A handle to the running journal. Cheap to clone; all clones share the
/// same background writer and failure counter.
#[derive(Clone)]
pub struct Journal {
    tx: mpsc::Sender<WriterMsg>,
    failures: Arc<FailureCounter>,
    /// A second connection for reads, guarded so `by_trace` never races the
    /// writer's own connection (spec §5: "reads and writes do not block each
    /// other" refers to WAL mode; this mutex only serializes our own reader
    /// handle, which is separate from the writer's).
    reader: Arc<Mutex<Store>>,
}

impl Journal {
    /// Open (or create) the durable store at `path` and start the batched
    /// writer. `batch_interval` is the T in "N events or T ms".
    pub async fn open(path: &Path, batch_interval: Duration) -> Result<Self, JournalError> {
        let writer_store = Store::open(path)?;
        let reader_store = Store::open(path)?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let failures = Arc::new(FailureCounter::default());
        writer::spawn(writer_store, rx, batch_interval, failures.clone());

        Ok(Journal { tx, failures, reader: Arc::new(Mutex::new(reader_store)) })
    }

    /// Fire-and-forget append (spec §4.1 `log`). Blocks briefly if the
    /// internal channel is full (spec §5 backpressure), but never on the
    /// durable flush itself.
    pub async fn log(
        &self,
        actor: impl Into<String>,
        action_type: impl Into<String>,
        target: impl Into<String>,
        payload: Value,
        trace_id: Option<Uuid>,
    ) -> Result<(), JournalError> {
        let event = JournalEvent::new(actor, action_type, target, payload, trace_id, Utc::now());
        self.tx.send(WriterMsg::Event(event)).await.map_err(|_| JournalError::Closed)
    }

    /// Completes once every event enqueued before this call is durable.
    pub async fn wait_for_flush(&self) -> Result<(), JournalError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send(WriterMsg::Flush(ack_tx)).await.map_err(|_| JournalError::Closed)?;
        ack_rx.await.map_err(|_| JournalError::Closed)
    }

    pub async fn by_trace(&self, trace_id: Uuid) -> Result<Vec<JournalEvent>, JournalError> {
        let reader = self.reader.lock().await;
        reader.by_trace(trace_id)
    }

    /// Flushes and releases resources. Safe to call more than once.
    pub async fn close(&self) -> Result<(), JournalError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterMsg::Shutdown(ack_tx)).await.is_err() {
            return Ok(());
        }
        let _ = ack_rx.await;
        Ok(())
    }

    /// Number of batches this journal has failed to persist. Logging errors
    /// are swallowed from the caller's perspective (spec §4.1); this is the
    /// rate-limited signal downstream monitoring can poll.
    pub fn failure_count(&self) -> u64 {
        self.failures.count()
    }

    pub async fn notify(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        proposal_id: Option<Uuid>,
        trace_id: Option<Uuid>,
        metadata: Value,
    ) -> Result<NotificationRow, JournalError> {
        let row = NotificationRow {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            proposal_id,
            trace_id,
            created_at: Utc::now(),
            dismissed_at: None,
            metadata,
        };
        let reader = self.reader.lock().await;
        reader.insert_notification(&row)?;
        Ok(row)
    }

    /// Idempotent: a second dismiss of an already-dismissed notification is
    /// a no-op (spec §3.2).
    pub async fn dismiss_notification(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), JournalError> {
        let reader = self.reader.lock().await;
        reader.dismiss_notification(id, at)
    }

    pub async fn get_notification(&self, id: Uuid) -> Result<Option<NotificationRow>, JournalError> {
        let reader = self.reader.lock().await;
        reader.get_notification(id)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
