// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! loom-router: dispatches Requests to a flow or a single agent, invokes
//! agents against an LLM provider, and drives Plan execution through to a
//! registered changeset (spec §4.7, §4.8).

pub mod agent_runner;
pub mod changeset;
pub mod executor;
pub mod processor;
pub mod provider;
pub mod router;
pub mod step_runner;

pub use agent_runner::{AgentRunner, LlmAgentRunner};
pub use changeset::{ChangesetRegistrar, NullChangesetRegistrar};
pub use executor::{ExecuteError, PlanExecutor};
pub use processor::{ProcessError, RequestProcessor};
pub use provider::{GenerateOptions, LlmProvider, MockProviderRegistry, ProviderRegistry};
pub use router::{RequestRouter, RouteOutcome};
pub use step_runner::RouterStepRunner;
