// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-flow: loads flow definitions and executes their step DAG (spec §4.4).

pub mod condition;
pub mod engine;
pub mod loader;
pub mod transform;

pub use condition::ConditionError;
pub use engine::{FlowEngine, FlowRunOutcome, FlowRunStatus, StepRunner};
pub use loader::{FlowLoadError, FlowLoader};
pub use transform::{Transform, TransformRegistry};
