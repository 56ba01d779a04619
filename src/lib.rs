//! chancery: the administrative delivery layer.
//!
//! Takes a handed-off execution plan (epics + work packages) and runs it
//! through a six-stage program lifecycle: intake, feasibility, commit,
//! activation, results, and an optional violation-handling halt. Every
//! stage appends to the program record and emits audit events; no failure
//! mode aborts a program run.

pub mod assignment;
pub mod capacity;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod orchestrator;
pub mod ports;
pub mod program;
pub mod retry;

pub use assignment::AssignmentEngine;
pub use capacity::CapacitySnapshotEngine;
pub use config::ChanceryConfig;
pub use error::{ChanceryError, Result};
pub use events::{AuditEvent, AuditSeverity};
pub use lifecycle::TaskLifecycleManager;
pub use orchestrator::ProgramOrchestrator;
pub use ports::{AuditPublisher, CapabilityExecutor, RoleDirectory};
pub use program::{
    AdministrativeBlockerReport, CompletionStatus, ExecutionHandoff, ExecutionProgram,
    ProgramStage, TaskLifecycleStatus,
};
pub use retry::{DeclineOutcome, RetryEscalationEngine};
