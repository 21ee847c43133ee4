// SPDX-License-Identifier: MIT

//! Data model entities (spec §3).

pub mod blueprint;
pub mod changeset;
pub mod flow;
pub mod journal_event;
pub mod plan;
pub mod request;
pub mod step_result;

pub use blueprint::{Blueprint, BlueprintError};
pub use changeset::{Changeset, ChangesetStatus};
pub use flow::{Flow, FlowOutput, FlowStep, FlowValidationError, InputSource, StepRetry};
pub use journal_event::{JournalEvent, NotificationKind, NotificationRow};
pub use plan::{Plan, PlanParseError, PlanStep};
pub use request::{Request, RequestParseError, RequestStatus};
pub use step_result::{StepResult, StepResultStatus};
