// SPDX-License-Identifier: MIT

//! The SQL-backed durable store (spec §4.1, §6: "an embedded SQL store with
//! write-ahead logging", `activity`/`notifications` tables).

use std::path::Path;

use chrono::{DateTime, Utc};
use loom_core::model::{JournalEvent, NotificationKind, NotificationRow};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::JournalError;

/// Owns the `rusqlite::Connection` and schema. Not `Sync`; always accessed
/// from the single writer task (spec §5: "the journal is process-wide; it
/// serializes writers through an internal queue").
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        let conn = Connection::open(path)
            .map_err(|source| JournalError::Open { path: path.display().to_string(), source })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, JournalError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), JournalError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS activity (
                id TEXT PRIMARY KEY,
                actor TEXT NOT NULL,
                action_type TEXT NOT NULL,
                target TEXT NOT NULL,
                payload TEXT NOT NULL,
                trace_id TEXT,
                timestamp TEXT NOT NULL,
                seq INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activity_trace_timestamp
                ON activity (trace_id, timestamp);

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                message TEXT NOT NULL,
                proposal_id TEXT,
                trace_id TEXT,
                created_at TEXT NOT NULL,
                dismissed_at TEXT,
                metadata TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notifications_dismissed_at
                ON notifications (dismissed_at);
            CREATE INDEX IF NOT EXISTS idx_notifications_proposal_id
                ON notifications (proposal_id);",
        )?;
        Ok(())
    }

    /// Append one batch of events inside a single transaction.
    pub fn append_batch(&mut self, events: &[JournalEvent]) -> Result<(), JournalError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO activity (id, actor, action_type, target, payload, trace_id, timestamp, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.id.to_string(),
                    event.actor,
                    event.action_type,
                    event.target,
                    serde_json::to_string(&event.payload)?,
                    event.trace_id.map(|id| id.to_string()),
                    event.timestamp.to_rfc3339(),
                    event.seq as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn by_trace(&self, trace_id: Uuid) -> Result<Vec<JournalEvent>, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor, action_type, target, payload, trace_id, timestamp, seq
             FROM activity WHERE trace_id = ?1 ORDER BY timestamp ASC, seq ASC",
        )?;
        let rows = stmt
            .query_map(params![trace_id.to_string()], Self::row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEvent> {
        let id: String = row.get(0)?;
        let trace_id: Option<String> = row.get(5)?;
        let timestamp: String = row.get(6)?;
        let payload: String = row.get(4)?;
        Ok(JournalEvent {
            id: id.parse().unwrap_or_default(),
            actor: row.get(1)?,
            action_type: row.get(2)?,
            target: row.get(3)?,
            payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
            trace_id: trace_id.and_then(|t| t.parse().ok()),
            timestamp: timestamp.parse().unwrap_or_else(|_| Utc::now()),
            seq: row.get::<_, i64>(7)? as u64,
        })
    }

    pub fn insert_notification(&self, row: &NotificationRow) -> Result<(), JournalError> {
        self.conn.execute(
            "INSERT INTO notifications (id, type, message, proposal_id, trace_id, created_at, dismissed_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id.to_string(),
                row.kind.to_string(),
                row.message,
                row.proposal_id.map(|id| id.to_string()),
                row.trace_id.map(|id| id.to_string()),
                row.created_at.to_rfc3339(),
                row.dismissed_at.map(|ts| ts.to_rfc3339()),
                serde_json::to_string(&row.metadata)?,
            ],
        )?;
        Ok(())
    }

    /// Dismiss a notification. Idempotent: a second dismiss leaves the first
    /// `dismissed_at` untouched (spec §3.2).
    pub fn dismiss_notification(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), JournalError> {
        self.conn.execute(
            "UPDATE notifications SET dismissed_at = ?1 WHERE id = ?2 AND dismissed_at IS NULL",
            params![at.to_rfc3339(), id.to_string()],
        )?;
        Ok(())
    }

    pub fn get_notification(&self, id: Uuid) -> Result<Option<NotificationRow>, JournalError> {
        self.conn
            .query_row(
                "SELECT id, type, message, proposal_id, trace_id, created_at, dismissed_at, metadata
                 FROM notifications WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_notification,
            )
            .optional()
            .map_err(JournalError::from)
    }

    fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRow> {
        let kind: String = row.get(1)?;
        let proposal_id: Option<String> = row.get(3)?;
        let trace_id: Option<String> = row.get(4)?;
        let dismissed_at: Option<String> = row.get(6)?;
        let metadata: String = row.get(7)?;
        Ok(NotificationRow {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            kind: parse_kind(&kind),
            message: row.get(2)?,
            proposal_id: proposal_id.and_then(|p| p.parse().ok()),
            trace_id: trace_id.and_then(|t| t.parse().ok()),
            created_at: row.get::<_, String>(5)?.parse().unwrap_or_else(|_| Utc::now()),
            dismissed_at: dismissed_at.and_then(|d| d.parse().ok()),
            metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
        })
    }
}

fn parse_kind(raw: &str) -> NotificationKind {
    match raw {
        "approved" => NotificationKind::Approved,
        "rejected" => NotificationKind::Rejected,
        "info" => NotificationKind::Info,
        "success" => NotificationKind::Success,
        "error" => NotificationKind::Error,
        _ => NotificationKind::Pending,
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
