// SPDX-License-Identifier: MIT

//! Changeset registration (spec §4.8, §1 Non-goals: "Git/changeset mechanics
//! ... treated as a black-box side effect that returns a content hash").

use async_trait::async_trait;
use loom_core::model::Changeset;

#[async_trait]
pub trait ChangesetRegistrar: Send + Sync {
    /// Register the changeset with the external VCS/portal integration,
    /// returning its commit sha.
    async fn register(&self, changeset: &Changeset) -> Result<String, String>;
}

/// Fakes registration with a deterministic hash derived from the changeset
/// id, for daemons run without a real VCS integration configured and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct NullChangesetRegistrar;

#[async_trait]
impl ChangesetRegistrar for NullChangesetRegistrar {
    async fn register(&self, changeset: &Changeset) -> Result<String, String> {
        Ok(format!("mock-{}", changeset.id.simple()))
    }
}

#[cfg(test)]
#[path = "changeset_tests.rs"]
mod tests;
