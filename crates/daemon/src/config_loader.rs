// SPDX-License-Identifier: MIT

//! Resolves `<root>/.loom/config.toml` plus environment overrides into a
//! [`loom_core::Config`] (spec §1: "Config file parsing ... the core
//! receives a resolved config value"; that resolution happens here).

use std::path::{Path, PathBuf};

use loom_core::Config;
use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("{0} is not valid TOML: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Load the config file at `<root>/.loom/config.toml` if present, apply
/// `LOOM_ROOT`/`LOOM_LOG` overrides, and return the resolved [`Config`].
/// A missing config file is not an error — defaults apply (spec §3.1).
pub fn load(root: &Path) -> Result<Config, ConfigLoadError> {
    let config_path = root.join(".loom").join("config.toml");
    let mut config = match std::fs::read_to_string(&config_path) {
        Ok(content) => {
            toml::from_str(&content).map_err(|e| ConfigLoadError::Parse(config_path.clone(), e))?
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(ConfigLoadError::Io(config_path, e)),
    };

    config.system.root = env::root_override().unwrap_or_else(|| root.to_path_buf());
    if let Some(level) = env::log_level_override() {
        config.system.log_level = level;
    }

    Ok(config)
}

#[cfg(test)]
#[path = "config_loader_tests.rs"]
mod tests;
