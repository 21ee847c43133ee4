// SPDX-License-Identifier: MIT

//! Environment variable overrides for the resolved [`loom_core::Config`]
//! (spec's AMBIENT STACK: "`LOOM_ROOT` overrides `system.root`").

use std::path::PathBuf;

/// `LOOM_ROOT` overrides `system.root` regardless of what the config file on
/// disk says.
pub fn root_override() -> Option<PathBuf> {
    std::env::var("LOOM_ROOT").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// `LOOM_LOG` overrides `system.log_level` (falls back to the config file's
/// value, then the hardcoded default).
pub fn log_level_override() -> Option<String> {
    std::env::var("LOOM_LOG").ok().filter(|s| !s.is_empty())
}
