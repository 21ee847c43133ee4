// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! loom-daemon: resolves configuration, holds the process lock, and wires
//! the watcher/router/journal crates into the running `loomd` process
//! (spec §2, §6).

pub mod config_loader;
pub mod env;
pub mod error;
pub mod lifecycle;

pub use config_loader::{load as load_config, ConfigLoadError};
pub use error::DaemonError;
pub use lifecycle::Daemon;
