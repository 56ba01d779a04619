use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::ActionReversibility;

/// Result of one executed activation attempt. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultArtifact {
    pub result_id: String,
    pub task_id: String,
    pub request_id: String,
    pub result_type: ResultType,
    pub action_reversibility: ActionReversibility,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl TaskResultArtifact {
    pub fn draft(
        task_id: impl Into<String>,
        request_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            result_id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            request_id: request_id.into(),
            result_type: ResultType::Draft,
            action_reversibility: ActionReversibility::Reversible,
            summary: summary.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    #[default]
    Draft,
    HumanVerified,
    AutomatedVerified,
}
