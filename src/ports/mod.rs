//! Ports to external collaborators. Each has a simulation null-object so the
//! orchestrator can be constructed without live backends; the choice is made
//! explicitly at construction time.

mod simulation;

use async_trait::async_trait;

use crate::error::Result;
use crate::events::AuditEvent;
use crate::program::{RoleIdentity, TaskActivationRequest, TaskResultArtifact};

pub use simulation::{SimulatedAuditPublisher, SimulatedExecutor, SimulatedRoleDirectory};

/// Performs a unit of work for an activation request and returns a draft
/// result artifact.
#[async_trait]
pub trait CapabilityExecutor: Send + Sync {
    async fn execute(&self, request: &TaskActivationRequest) -> Result<TaskResultArtifact>;

    fn list_available(&self) -> Vec<String>;

    fn health_check(&self, capability: &str) -> bool;
}

/// Fire-and-forget sink for audit-grade events. Callers swallow publication
/// failures; a broken audit trail must never block program progress.
#[async_trait]
pub trait AuditPublisher: Send + Sync {
    async fn publish(&self, event: AuditEvent) -> Result<()>;
}

/// Supplies the ranked, branch-tagged pool of assignable identities.
pub trait RoleDirectory: Send + Sync {
    fn get_by_branch(&self, branch: &str) -> Vec<RoleIdentity>;

    fn get_by_id(&self, id: &str) -> Option<RoleIdentity>;
}
