// SPDX-License-Identifier: MIT

//! Request documents (spec §3.1, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::frontmatter::{self, FrontmatterError};

/// Lifecycle status of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

crate::simple_display! {
    RequestStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A natural-language work item dropped into `Inbox/Requests` (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub trace_id: Uuid,
    pub agent_id: String,
    #[serde(default)]
    pub status: RequestStatus,
    pub priority: u8,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub skip_skills: Vec<String>,
    pub flow: Option<String>,
    pub model: Option<String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum RequestParseError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    #[error("frontmatter is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("trace_id is not a valid UUID: {0}")]
    InvalidTraceId(#[from] uuid::Error),
    #[error("agent_id must not be empty")]
    EmptyAgentId,
    #[error("priority {0} is out of range [0, 10]")]
    PriorityOutOfRange(i64),
}

/// Frontmatter-only shape used to deserialize the YAML block before
/// validating and assembling the full [`Request`].
#[derive(Debug, Deserialize)]
struct RequestFrontmatter {
    trace_id: Option<String>,
    agent_id: Option<String>,
    #[serde(default)]
    status: RequestStatus,
    priority: Option<i64>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    skip_skills: Vec<String>,
    flow: Option<String>,
    model: Option<String>,
}

impl Request {
    /// Parse a Request document from raw markdown-with-frontmatter text.
    pub fn parse(content: &str) -> Result<Self, RequestParseError> {
        let doc = frontmatter::split(content)?;
        let fm: RequestFrontmatter = serde_yaml::from_value(doc.frontmatter)
            .map_err(FrontmatterError::InvalidYaml)?;

        let trace_id_str = fm.trace_id.ok_or(RequestParseError::MissingField("trace_id"))?;
        let trace_id = Uuid::parse_str(&trace_id_str)?;

        let agent_id = fm.agent_id.ok_or(RequestParseError::MissingField("agent_id"))?;
        if agent_id.trim().is_empty() {
            return Err(RequestParseError::EmptyAgentId);
        }

        let priority = fm.priority.unwrap_or(5);
        if !(0..=10).contains(&priority) {
            return Err(RequestParseError::PriorityOutOfRange(priority));
        }

        Ok(Request {
            trace_id,
            agent_id,
            status: fm.status,
            priority: priority as u8,
            created_at: fm.created_at,
            tags: fm.tags,
            skills: fm.skills,
            skip_skills: fm.skip_skills,
            flow: fm.flow.filter(|s| !s.is_empty()),
            model: fm.model,
            body: doc.body,
        })
    }

    /// Whether this request opted into flow (DAG) dispatch (spec §4.7).
    pub fn wants_flow(&self) -> bool {
        self.flow.is_some()
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
