// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-core: data model, id/clock primitives, and document parsing shared
//! by every crate in the daemon.

pub mod macros;

pub mod clock;
pub mod config;
pub mod frontmatter;
pub mod id;
pub mod model;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{AgentsConfig, Config, PathsConfig, SystemConfig, WatcherConfig};
pub use frontmatter::{FrontmatterError, RawDocument};
pub use id::short;
pub use model::{
    Blueprint, BlueprintError, Changeset, ChangesetStatus, Flow, FlowOutput, FlowStep,
    FlowValidationError, InputSource, JournalEvent, NotificationKind, NotificationRow, Plan,
    PlanParseError, PlanStep, Request, RequestParseError, RequestStatus, StepResult,
    StepResultStatus, StepRetry,
};
