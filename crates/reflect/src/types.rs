// SPDX-License-Identifier: MIT

//! Data types shared by the reflector (spec §4.3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation to run and judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub parameters: Value,
    pub purpose: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// What the executor returned for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: Value,
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Error,
    Incomplete,
    Unexpected,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub description: String,
    pub severity: IssueSeverity,
}

/// The LLM-judged verdict for one execution (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,
    pub confidence: u8,
    pub achieved_purpose: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
    pub retry_suggested: bool,
    pub retry_reason: Option<String>,
    pub alternative_parameters: Option<Value>,
    pub insights: Option<String>,
}

impl Verdict {
    /// A critical issue forces failure regardless of confidence (spec §4.3).
    pub fn has_critical_issue(&self) -> bool {
        self.issues.iter().any(|issue| issue.severity == IssueSeverity::Critical)
    }

    pub fn effective_success(&self) -> bool {
        self.success && !self.has_critical_issue()
    }
}

/// The final outcome of reflecting on one [`ToolCall`], possibly after
/// several retries with adjusted parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectedResult {
    pub call_id: String,
    pub success: bool,
    pub execution: ExecutionResult,
    pub verdict: Verdict,
    pub attempts: u32,
}
