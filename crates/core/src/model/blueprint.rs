// SPDX-License-Identifier: MIT

//! Blueprint documents: agent definitions (spec §3.1, §4.6).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use crate::frontmatter::{self, FrontmatterError};

#[allow(clippy::expect_used)]
fn agent_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("constant regex pattern is valid"))
}

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    #[error("blueprint agent_id `{0}` must be lowercase alphanumeric-and-hyphens")]
    InvalidAgentId(String),
    #[error("blueprint model `{0}` must be in `provider:model` form")]
    InvalidModel(String),
    #[error("blueprint version `{0}` is not valid semver: {1}")]
    InvalidVersion(String, String),
    #[error("blueprint system prompt body must not be empty")]
    EmptyPrompt,
}

#[derive(Debug, Deserialize, Default)]
struct BlueprintFrontmatter {
    agent_id: Option<String>,
    name: Option<String>,
    model: Option<String>,
    #[serde(default)]
    capabilities: Vec<String>,
    version: Option<String>,
    #[serde(default)]
    default_skills: Vec<String>,
    #[serde(default)]
    reflexive: bool,
    max_reflexion_iterations: Option<u32>,
    #[serde(default)]
    confidence_required: bool,
    #[serde(default)]
    memory_enabled: bool,
}

/// An agent definition: identity, model, capabilities, and a system prompt
/// body (spec §3.1, §4.6). The id on disk (`<agent_id>.md`) is passed in by
/// the loader since a back-compat document may omit it from frontmatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub agent_id: String,
    pub name: String,
    pub model: Option<String>,
    pub capabilities: Vec<String>,
    pub version: Option<String>,
    pub default_skills: Vec<String>,
    pub reflexive: bool,
    pub max_reflexion_iterations: Option<u32>,
    pub confidence_required: bool,
    pub memory_enabled: bool,
    pub system_prompt: String,
}

impl Blueprint {
    /// Parse a Blueprint document, back-filling `agent_id` from the file stem
    /// when frontmatter omits it, and deriving `name` (kebab → title case)
    /// when frontmatter omits it.
    pub fn parse(id_from_filename: &str, content: &str, default_model: &str) -> Result<Self, BlueprintError> {
        let (fm, system_prompt) = match frontmatter::split(content) {
            Ok(doc) => {
                let fm: BlueprintFrontmatter =
                    serde_yaml::from_value(doc.frontmatter).map_err(FrontmatterError::InvalidYaml)?;
                (fm, doc.body)
            }
            Err(FrontmatterError::NoFrontmatter) => (BlueprintFrontmatter::default(), content.to_string()),
            Err(other) => return Err(other.into()),
        };

        let agent_id = fm.agent_id.unwrap_or_else(|| id_from_filename.to_string());
        if !agent_id_pattern().is_match(&agent_id) {
            return Err(BlueprintError::InvalidAgentId(agent_id));
        }

        if let Some(model) = &fm.model {
            validate_model(model)?;
        }
        if let Some(version) = &fm.version {
            validate_semver(version)?;
        }

        let system_prompt = system_prompt.trim().to_string();
        if system_prompt.is_empty() {
            return Err(BlueprintError::EmptyPrompt);
        }

        let name = fm.name.unwrap_or_else(|| kebab_to_title(&agent_id));
        let model = fm.model.or_else(|| Some(default_model.to_string()));

        Ok(Blueprint {
            agent_id,
            name,
            model,
            capabilities: fm.capabilities,
            version: fm.version,
            default_skills: fm.default_skills,
            reflexive: fm.reflexive,
            max_reflexion_iterations: fm.max_reflexion_iterations,
            confidence_required: fm.confidence_required,
            memory_enabled: fm.memory_enabled,
            system_prompt,
        })
    }
}

fn validate_model(model: &str) -> Result<(), BlueprintError> {
    match model.split_once(':') {
        Some((provider, name)) if !provider.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(BlueprintError::InvalidModel(model.to_string())),
    }
}

fn validate_semver(version: &str) -> Result<(), BlueprintError> {
    let parts: Vec<_> = version.split('.').collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        Ok(())
    } else {
        Err(BlueprintError::InvalidVersion(version.to_string(), "expected MAJOR.MINOR.PATCH".to_string()))
    }
}

fn kebab_to_title(id: &str) -> String {
    id.split('-')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "blueprint_tests.rs"]
mod tests;
