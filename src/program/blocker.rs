use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// First-class record of an impediment. Created by feasibility checks or the
/// retry/escalation engine; the disposition is assigned later by an external
/// resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrativeBlockerReport {
    pub report_id: String,
    pub program_id: String,
    pub summary: String,
    pub blocker_type: BlockerType,
    pub severity: BlockerSeverity,

    #[serde(default)]
    pub affected_task_ids: Vec<String>,

    pub requested_action: RequestedAction,

    /// Unresolved until an external resolver sets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<Disposition>,

    pub created_at: DateTime<Utc>,
}

impl AdministrativeBlockerReport {
    pub fn new(
        program_id: impl Into<String>,
        summary: impl Into<String>,
        blocker_type: BlockerType,
        severity: BlockerSeverity,
        requested_action: RequestedAction,
    ) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            program_id: program_id.into(),
            summary: summary.into(),
            blocker_type,
            severity,
            affected_task_ids: Vec::new(),
            requested_action,
            disposition: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_affected_tasks(mut self, task_ids: Vec<String>) -> Self {
        self.affected_task_ids = task_ids;
        self
    }

    pub fn is_unresolved(&self) -> bool {
        self.disposition.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerType {
    MissingScope,
    UnresolvedEpic,
    CapacityUnavailable,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerSeverity {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedAction {
    ReviseHandoff,
    ReduceScope,
    EscalateToResolver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Resolved,
    AcceptedRisk,
    Rejected,
}
