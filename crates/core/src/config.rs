// SPDX-License-Identifier: MIT

//! Resolved daemon configuration.
//!
//! The core never parses a config file itself — it receives an already
//! resolved [`Config`] value (spec §1: "Config file parsing ... the core
//! receives a resolved config value"). `loom-daemon` is responsible for
//! reading `<root>/.loom/config.toml` and environment overrides and handing
//! the result down as an `Arc<Config>`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Paths under the workspace root the daemon watches and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub inbox: String,
    pub blueprints: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { inbox: "Inbox".to_string(), blueprints: "Blueprints".to_string() }
    }
}

/// File watcher tuning knobs (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub debounce_ms: u64,
    pub stability_check: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { debounce_ms: 500, stability_check: true }
    }
}

/// Agent-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// `provider:model` identifier used when a request/blueprint omits one.
    pub default_model: String,
    /// Blueprint id used when a request omits `agent_id` (spec §4.7: "the
    /// daemon's default agent").
    pub default_agent_id: String,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            default_model: "anthropic:claude-sonnet".to_string(),
            default_agent_id: "default-agent".to_string(),
        }
    }
}

/// Top-level system settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub root: PathBuf,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("."), log_level: "info".to_string() }
    }
}

/// Immutable, process-lifetime configuration (spec §3.1).
///
/// Resolved once at startup and shared read-only via `Arc<Config>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub paths: PathsConfig,
    pub watcher: WatcherConfig,
    pub agents: AgentsConfig,
}

impl Config {
    /// The workspace root all other paths are relative to.
    pub fn root(&self) -> &Path {
        &self.system.root
    }

    pub fn inbox_requests(&self) -> PathBuf {
        self.root().join(&self.paths.inbox).join("Requests")
    }

    pub fn inbox_plans(&self) -> PathBuf {
        self.root().join(&self.paths.inbox).join("Plans")
    }

    pub fn active_plans(&self) -> PathBuf {
        self.system_dir().join("Active")
    }

    pub fn blueprints_dir(&self) -> PathBuf {
        self.root().join(&self.paths.blueprints)
    }

    pub fn flows_dir(&self) -> PathBuf {
        self.root().join("Flows")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.root().join("journal.db")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.root().join("Memory")
    }

    pub fn system_dir(&self) -> PathBuf {
        self.root().join("System")
    }

    pub fn daemon_log_path(&self) -> PathBuf {
        self.system_dir().join("daemon.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.system_dir().join("daemon.lock")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
