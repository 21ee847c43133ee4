// SPDX-License-Identifier: MIT

//! Changeset records (spec §3.1, GLOSSARY "Changeset").
//!
//! A changeset refers to a set of file changes produced by a plan execution;
//! the daemon registers it through the (external) changeset registrar
//! capability but never applies version-control operations itself (spec §1
//! Non-goals: "Git/changeset mechanics ... treated as a black-box side
//! effect that returns a content hash").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangesetStatus {
    Pending,
    Approved,
    Rejected,
}

crate::simple_display! {
    ChangesetStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl Default for ChangesetStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    pub id: Uuid,
    pub trace_id: Uuid,
    pub portal: String,
    pub branch: String,
    pub status: ChangesetStatus,
    pub description: String,
    pub commit_sha: Option<String>,
    pub files_changed: u32,
    pub created: DateTime<Utc>,
    pub created_by: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl Changeset {
    pub fn new(
        trace_id: Uuid,
        portal: impl Into<String>,
        branch: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Changeset {
            id: Uuid::new_v4(),
            trace_id,
            portal: portal.into(),
            branch: branch.into(),
            status: ChangesetStatus::Pending,
            description: description.into(),
            commit_sha: None,
            files_changed: 0,
            created,
            created_by: created_by.into(),
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
        }
    }

    /// Approve with the registrar's returned content hash. A no-op once
    /// already approved or rejected.
    pub fn approve(&mut self, commit_sha: impl Into<String>, files_changed: u32, at: DateTime<Utc>) {
        if self.status != ChangesetStatus::Pending {
            return;
        }
        self.status = ChangesetStatus::Approved;
        self.commit_sha = Some(commit_sha.into());
        self.files_changed = files_changed;
        self.approved_at = Some(at);
    }

    /// Reject with a reason. A no-op once already approved or rejected.
    pub fn reject(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        if self.status != ChangesetStatus::Pending {
            return;
        }
        self.status = ChangesetStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        self.rejected_at = Some(at);
    }
}

#[cfg(test)]
#[path = "changeset_tests.rs"]
mod tests;
