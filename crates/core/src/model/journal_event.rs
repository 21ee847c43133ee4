// SPDX-License-Identifier: MIT

//! Journal entities: append-only activity events and notifications (spec
//! §3.1, §4.1, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An append-only activity record (spec §3.1, §6 `activity` table).
///
/// `seq` is a monotonic tiebreaker for events whose `timestamp` compares
/// equal (spec §5: "a monotonic sequence counter is used to break ties of
/// equal timestamp"). It is assigned by the journal writer, not the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEvent {
    pub id: Uuid,
    pub actor: String,
    pub action_type: String,
    pub target: String,
    pub payload: Value,
    pub trace_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
}

impl JournalEvent {
    /// Build a new event with `seq` left at 0; the journal writer assigns
    /// the real sequence number on enqueue.
    pub fn new(
        actor: impl Into<String>,
        action_type: impl Into<String>,
        target: impl Into<String>,
        payload: Value,
        trace_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        JournalEvent {
            id: Uuid::new_v4(),
            actor: actor.into(),
            action_type: action_type.into(),
            target: target.into(),
            payload,
            trace_id,
            timestamp,
            seq: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Pending,
    Approved,
    Rejected,
    Info,
    Success,
    Error,
}

crate::simple_display! {
    NotificationKind {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Info => "info",
        Success => "success",
        Error => "error",
    }
}

/// A user-facing notification (spec §3.1, §6 `notifications` table).
/// Active iff `dismissed_at.is_none()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRow {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub proposal_id: Option<Uuid>,
    pub trace_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub metadata: Value,
}

impl NotificationRow {
    pub fn is_active(&self) -> bool {
        self.dismissed_at.is_none()
    }

    /// Dismiss. A no-op if already dismissed (spec §3.2: "a second dismiss
    /// is a no-op, first timestamp wins").
    pub fn dismiss(&mut self, at: DateTime<Utc>) {
        if self.dismissed_at.is_none() {
            self.dismissed_at = Some(at);
        }
    }
}

#[cfg(test)]
#[path = "journal_event_tests.rs"]
mod tests;
