// SPDX-License-Identifier: MIT

//! Plan documents (spec §3.1, §4.8, §8 scenario 5).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

use crate::frontmatter::{self, FrontmatterError};

#[allow(clippy::expect_used)]
fn step_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^##\s*Step\s+(\d+):\s*(.+?)\s*$").expect("constant regex pattern is valid"))
}

/// A single numbered step within a [`Plan`]'s body (spec §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub number: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    #[error("frontmatter is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("trace_id is not a valid UUID: {0}")]
    InvalidTraceId(#[from] uuid::Error),
    #[error("plan has no `## Step N: title` headings")]
    NoSteps,
    #[error("step {0} has an empty title")]
    EmptyTitle(u32),
    #[error("step {0} is numbered more than once")]
    DuplicateStep(u32),
}

#[derive(Debug, Deserialize)]
struct PlanFrontmatter {
    trace_id: Option<String>,
    request_id: Option<String>,
    agent: Option<String>,
    model: Option<String>,
    flow: Option<String>,
}

/// A sequence of numbered steps produced from a [`super::Request`] (spec §3.1,
/// §4.8). Step numbers are expected to form `1..K` without gaps; a gap
/// between otherwise-valid steps is tolerated (flagged via
/// [`Plan::non_sequential`]) rather than rejected, matching the documented
/// end-to-end behavior of a plan with steps 1 and 3 but no 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub trace_id: Uuid,
    pub request_id: String,
    pub agent: Option<String>,
    pub model: Option<String>,
    pub flow: Option<String>,
    pub steps: Vec<PlanStep>,
    /// True when step numbers are not a contiguous `1..K` run. The caller
    /// journals this as a warning rather than treating it as a parse failure.
    pub non_sequential: bool,
}

impl Plan {
    pub fn parse(content: &str) -> Result<Self, PlanParseError> {
        let doc = frontmatter::split(content)?;
        let fm: PlanFrontmatter = serde_yaml::from_value(doc.frontmatter)
            .map_err(FrontmatterError::InvalidYaml)?;

        let trace_id_str = fm.trace_id.ok_or(PlanParseError::MissingField("trace_id"))?;
        let trace_id = Uuid::parse_str(&trace_id_str)?;
        let request_id = fm.request_id.ok_or(PlanParseError::MissingField("request_id"))?;

        let steps = Self::parse_steps(&doc.body)?;
        let non_sequential = !Self::is_contiguous(&steps);

        Ok(Plan {
            trace_id,
            request_id,
            agent: fm.agent,
            model: fm.model,
            flow: fm.flow,
            steps,
            non_sequential,
        })
    }

    fn parse_steps(body: &str) -> Result<Vec<PlanStep>, PlanParseError> {
        let re = step_heading();
        let matches: Vec<_> = re.captures_iter(body).collect();
        if matches.is_empty() {
            return Err(PlanParseError::NoSteps);
        }

        let mut steps = Vec::with_capacity(matches.len());
        let mut seen = std::collections::HashSet::new();

        for (idx, cap) in matches.iter().enumerate() {
            let number: u32 = cap[1].parse().unwrap_or(0);
            let title = cap[2].trim().to_string();
            if title.is_empty() {
                return Err(PlanParseError::EmptyTitle(number));
            }
            if !seen.insert(number) {
                return Err(PlanParseError::DuplicateStep(number));
            }

            let start = cap.get(0).map(|m| m.end()).unwrap_or(0);
            let end = matches
                .get(idx + 1)
                .and_then(|m| m.get(0))
                .map(|m| m.start())
                .unwrap_or(body.len());
            let content = body[start..end].trim().to_string();

            steps.push(PlanStep { number, title, content });
        }

        steps.sort_by_key(|s| s.number);
        Ok(steps)
    }

    fn is_contiguous(steps: &[PlanStep]) -> bool {
        steps.iter().enumerate().all(|(i, s)| s.number as usize == i + 1)
    }

    pub fn wants_flow(&self) -> bool {
        self.flow.is_some()
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
