//! Configuration types and loading.
//!
//! Provides the configuration structures for chancery:
//! - `ChanceryConfig`: Top-level configuration with validation
//! - Domain configs: orchestrator, capacity, assignment

mod settings;

pub use settings::{AssignmentConfig, CapacityConfig, ChanceryConfig, OrchestratorConfig};
