//! Domain model for execution programs: the aggregate root, task lifecycle
//! statuses, activation requests, result artifacts, capacity snapshots,
//! blocker reports, and assignments.

mod artifact;
mod assignment;
mod blocker;
mod handoff;
mod request;
mod snapshot;
mod stage;
mod status;
mod types;

pub use artifact::{ResultType, TaskResultArtifact};
pub use assignment::{DukeAssignment, EarlAssignment, RoleIdentity};
pub use blocker::{
    AdministrativeBlockerReport, BlockerSeverity, BlockerType, Disposition, RequestedAction,
};
pub use handoff::{Epic, ExecutionHandoff, WorkPackage};
pub use request::{ActionReversibility, TaskActivationRequest};
pub use snapshot::{CapacityConfidence, CapacitySnapshot};
pub use stage::{CompletionStatus, ProgramStage};
pub use status::TaskLifecycleStatus;
pub use types::ExecutionProgram;
