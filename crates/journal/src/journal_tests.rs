// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;
use tempfile::tempdir;

async fn open_test_journal() -> (Journal, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.db");
    let journal = Journal::open(&path, Duration::from_millis(20)).await.unwrap();
    (journal, dir)
}

#[tokio::test]
async fn log_then_wait_for_flush_makes_event_readable() {
    let (journal, _dir) = open_test_journal().await;
    let trace_id = Uuid::new_v4();
    journal.log("loomd", "file.detected", "req-1.md", serde_json::json!({}), Some(trace_id)).await.unwrap();
    journal.wait_for_flush().await.unwrap();

    let events = journal.by_trace(trace_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action_type, "file.detected");
}

#[tokio::test]
async fn events_are_returned_in_timestamp_order() {
    let (journal, _dir) = open_test_journal().await;
    let trace_id = Uuid::new_v4();
    journal.log("loomd", "file.detected", "req-1.md", serde_json::json!({}), Some(trace_id)).await.unwrap();
    journal.log("loomd", "request.routed.agent", "req-1.md", serde_json::json!({}), Some(trace_id)).await.unwrap();
    journal.wait_for_flush().await.unwrap();

    let events = journal.by_trace(trace_id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action_type, "file.detected");
    assert_eq!(events[1].action_type, "request.routed.agent");
}

#[tokio::test]
async fn timer_flush_persists_without_explicit_wait() {
    let (journal, _dir) = open_test_journal().await;
    let trace_id = Uuid::new_v4();
    journal.log("loomd", "file.detected", "req-1.md", serde_json::json!({}), Some(trace_id)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let events = journal.by_trace(trace_id).await.unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn by_trace_excludes_unrelated_events() {
    let (journal, _dir) = open_test_journal().await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    journal.log("loomd", "file.detected", "a.md", serde_json::json!({}), Some(a)).await.unwrap();
    journal.log("loomd", "file.detected", "b.md", serde_json::json!({}), Some(b)).await.unwrap();
    journal.wait_for_flush().await.unwrap();

    assert_eq!(journal.by_trace(a).await.unwrap().len(), 1);
    assert_eq!(journal.by_trace(b).await.unwrap().len(), 1);
}

#[tokio::test]
async fn close_flushes_pending_events() {
    let (journal, _dir) = open_test_journal().await;
    let trace_id = Uuid::new_v4();
    journal.log("loomd", "file.detected", "req-1.md", serde_json::json!({}), Some(trace_id)).await.unwrap();
    journal.close().await.unwrap();

    let events = journal.by_trace(trace_id).await.unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn notification_lifecycle_and_dismiss_idempotence() {
    let (journal, _dir) = open_test_journal().await;
    let row = journal
        .notify(NotificationKind::Error, "step failed", None, None, serde_json::json!({}))
        .await
        .unwrap();
    assert!(row.dismissed_at.is_none());

    let first = Utc::now();
    journal.dismiss_notification(row.id, first).await.unwrap();
    let second = first + chrono::Duration::seconds(10);
    journal.dismiss_notification(row.id, second).await.unwrap();

    let fetched = journal.get_notification(row.id).await.unwrap().unwrap();
    assert_eq!(fetched.dismissed_at.unwrap().timestamp(), first.timestamp());
}

#[tokio::test]
async fn failure_count_starts_at_zero() {
    let (journal, _dir) = open_test_journal().await;
    assert_eq!(journal.failure_count(), 0);
}
