//! In-memory simulation implementations of the ports. Used when no live
//! backend is configured, and by tests to observe orchestrator behavior.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ChanceryError, Result};
use crate::events::AuditEvent;
use crate::program::{RoleIdentity, TaskActivationRequest, TaskResultArtifact};

use super::{AuditPublisher, CapabilityExecutor, RoleDirectory};

/// Executor that completes every request with a draft artifact, except for
/// clusters explicitly marked as failing.
#[derive(Default)]
pub struct SimulatedExecutor {
    failing_clusters: HashSet<String>,
    executed: Mutex<Vec<String>>,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests targeting these clusters fail with an executor error.
    pub fn with_failing_clusters(clusters: impl IntoIterator<Item = String>) -> Self {
        Self {
            failing_clusters: clusters.into_iter().collect(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Request ids seen so far, in execution order.
    pub fn executed_requests(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl CapabilityExecutor for SimulatedExecutor {
    async fn execute(&self, request: &TaskActivationRequest) -> Result<TaskResultArtifact> {
        self.executed.lock().push(request.request_id.clone());
        if self.failing_clusters.contains(&request.target_cluster_id) {
            return Err(ChanceryError::Executor(format!(
                "cluster {} unavailable",
                request.target_cluster_id
            )));
        }
        Ok(TaskResultArtifact::draft(
            &request.task_id,
            &request.request_id,
            format!("simulated execution of {}", request.scope_description),
        ))
    }

    fn list_available(&self) -> Vec<String> {
        vec!["simulation".to_string()]
    }

    fn health_check(&self, _capability: &str) -> bool {
        true
    }
}

/// Publisher that records every event for later inspection.
#[derive(Default)]
pub struct SimulatedAuditPublisher {
    events: Mutex<Vec<AuditEvent>>,
    fail_all: bool,
}

impl SimulatedAuditPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publisher whose every publish fails, for exercising the
    /// swallow-and-continue contract.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_all: true,
        }
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    pub fn count_of(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

#[async_trait]
impl AuditPublisher for SimulatedAuditPublisher {
    async fn publish(&self, event: AuditEvent) -> Result<()> {
        if self.fail_all {
            return Err(ChanceryError::AuditPublish("sink offline".to_string()));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

/// Directory backed by a fixed candidate list.
#[derive(Default)]
pub struct SimulatedRoleDirectory {
    identities: Vec<RoleIdentity>,
}

impl SimulatedRoleDirectory {
    pub fn new(identities: Vec<RoleIdentity>) -> Self {
        Self { identities }
    }

    /// An empty directory; assignment falls back to the synthetic
    /// simulation identity.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl RoleDirectory for SimulatedRoleDirectory {
    fn get_by_branch(&self, branch: &str) -> Vec<RoleIdentity> {
        self.identities
            .iter()
            .filter(|i| i.branch == branch)
            .cloned()
            .collect()
    }

    fn get_by_id(&self, id: &str) -> Option<RoleIdentity> {
        self.identities.iter().find(|i| i.id == id).cloned()
    }
}
