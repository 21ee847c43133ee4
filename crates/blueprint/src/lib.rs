// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! loom-blueprint: loads and caches agent definitions (spec §4.6).

use std::path::PathBuf;
use std::sync::Arc;

use loom_core::model::{Blueprint, BlueprintError as ParseError};
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("blueprint `{0}` not found under {1}")]
    NotFound(String, String),
    #[error("failed to read blueprint `{0}`: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("blueprint `{0}` failed to parse: {1}")]
    Parse(String, #[source] ParseError),
}

/// Loads agent definitions from `<blueprints_root>/<agent_id>.md`, caching
/// parsed [`Blueprint`]s by id (spec §4.6). Reads are lock-free after a
/// one-time publish; writes (load-miss, invalidate, clear) go through a
/// writer lock (spec §5).
pub struct BlueprintLoader {
    root: PathBuf,
    default_model: String,
    cache: Arc<RwLock<std::collections::HashMap<String, Arc<Blueprint>>>>,
}

impl BlueprintLoader {
    pub fn new(root: impl Into<PathBuf>, default_model: impl Into<String>) -> Self {
        BlueprintLoader {
            root: root.into(),
            default_model: default_model.into(),
            cache: Arc::new(RwLock::new(std::collections::HashMap::new())),
        }
    }

    /// Return a cached blueprint, or load, parse, and cache it.
    pub async fn load(&self, agent_id: &str) -> Result<Arc<Blueprint>, LoadError> {
        if let Some(cached) = self.cache.read().get(agent_id).cloned() {
            return Ok(cached);
        }

        let path = self.path_for(agent_id);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(agent_id.to_string(), self.root.display().to_string())
            } else {
                LoadError::Io(agent_id.to_string(), e)
            }
        })?;

        let blueprint = Blueprint::parse(agent_id, &content, &self.default_model)
            .map_err(|e| LoadError::Parse(agent_id.to_string(), e))?;
        let blueprint = Arc::new(blueprint);

        self.cache.write().insert(agent_id.to_string(), blueprint.clone());
        Ok(blueprint)
    }

    pub fn invalidate(&self, agent_id: &str) {
        self.cache.write().remove(agent_id);
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn path_for(&self, agent_id: &str) -> PathBuf {
        self.root.join(format!("{agent_id}.md"))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
