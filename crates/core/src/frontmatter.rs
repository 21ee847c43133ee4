// SPDX-License-Identifier: MIT

//! YAML frontmatter + markdown body splitting, shared by Request, Plan, and
//! Blueprint parsing (spec §6: "YAML frontmatter (between `---` fences) then
//! markdown body").
//!
//! Frontmatter is modeled as `serde_yaml::Value` rather than a fixed struct
//! (Design Notes: "Dynamic frontmatter ... model as map<string, any> plus a
//! schema-validated struct per known document kind; unknown keys are
//! preserved but ignored"). Callers deserialize the fields they recognize out
//! of the `Value` and ignore the rest.

use thiserror::Error;

/// A document split into frontmatter and body.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub frontmatter: serde_yaml::Value,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("document has no frontmatter fences (expected leading `---`)")]
    NoFrontmatter,
    #[error("frontmatter is not terminated by a closing `---` fence")]
    Unterminated,
    #[error("frontmatter is not valid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Split a document of the form:
///
/// ```text
/// ---
/// key: value
/// ---
/// body text
/// ```
///
/// into its frontmatter and body. Leading blank lines before the first fence
/// are tolerated.
pub fn split(content: &str) -> Result<RawDocument, FrontmatterError> {
    let mut lines = content.lines();
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            continue;
        }
        if line.trim() != "---" {
            return Err(FrontmatterError::NoFrontmatter);
        }
        break;
    }

    let mut fm_lines = Vec::new();
    let mut found_close = false;
    for line in lines.by_ref() {
        if line.trim() == "---" {
            found_close = true;
            break;
        }
        fm_lines.push(line);
    }
    if !found_close {
        return Err(FrontmatterError::Unterminated);
    }

    let frontmatter: serde_yaml::Value = if fm_lines.iter().all(|l| l.trim().is_empty()) {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(&fm_lines.join("\n"))?
    };

    let body = lines.collect::<Vec<_>>().join("\n");
    Ok(RawDocument { frontmatter, body: body.trim_start_matches('\n').to_string() })
}

/// Render a frontmatter value and body back into document text.
pub fn render(frontmatter: &serde_yaml::Value, body: &str) -> Result<String, FrontmatterError> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
