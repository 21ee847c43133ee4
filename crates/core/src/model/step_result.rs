// SPDX-License-Identifier: MIT

//! Step execution outcomes (spec §3.1, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResultStatus {
    Completed,
    Failed,
    Skipped,
}

crate::simple_display! {
    StepResultStatus {
        Completed => "completed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

/// The outcome of running one [`super::FlowStep`] (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub status: StepResultStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn completed(step_id: impl Into<String>, output: serde_json::Value, duration_ms: u64) -> Self {
        StepResult {
            step_id: step_id.into(),
            status: StepResultStatus::Completed,
            output: Some(output),
            error: None,
            duration_ms,
        }
    }

    pub fn failed(step_id: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        StepResult {
            step_id: step_id.into(),
            status: StepResultStatus::Failed,
            output: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    pub fn skipped(step_id: impl Into<String>) -> Self {
        StepResult {
            step_id: step_id.into(),
            status: StepResultStatus::Skipped,
            output: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, StepResultStatus::Completed | StepResultStatus::Failed)
    }
}

#[cfg(test)]
#[path = "step_result_tests.rs"]
mod tests;
