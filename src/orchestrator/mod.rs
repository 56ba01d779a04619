//! Execution program orchestrator: sequences the six lifecycle stages and
//! emits the full audit trail.

mod engine;

pub use engine::ProgramOrchestrator;
