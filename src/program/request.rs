use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attempt to get a task executed. Immutable once created: a retry is a
/// new request chained through `original_request_id`, never a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskActivationRequest {
    pub request_id: String,
    pub task_id: String,
    pub program_id: String,
    /// Routing identity (Earl) responsible for shepherding this attempt.
    pub router_id: String,
    pub scope_description: String,

    #[serde(default)]
    pub constraints: Vec<String>,

    pub success_definition: String,

    #[serde(default)]
    pub required_capabilities: Vec<String>,

    pub action_reversibility: ActionReversibility,
    pub activation_deadline: DateTime<Utc>,
    pub max_deadline: DateTime<Utc>,
    pub target_cluster_id: String,

    #[serde(default)]
    pub retry_count: u32,

    /// Root of the retry chain. None for the first attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_request_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl TaskActivationRequest {
    /// The id the whole retry chain hangs off: the root request's own id.
    pub fn chain_root_id(&self) -> &str {
        self.original_request_id.as_deref().unwrap_or(&self.request_id)
    }

    /// Follow-up attempt against the same cluster. Cross-cluster substitution
    /// is never performed here: the target is carried over verbatim.
    pub fn same_cluster_retry(&self, now: DateTime<Utc>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            retry_count: self.retry_count + 1,
            original_request_id: Some(self.chain_root_id().to_string()),
            created_at: now,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionReversibility {
    #[default]
    Reversible,
    Irreversible,
}
