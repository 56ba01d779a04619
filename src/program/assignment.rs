use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assignable identity from the role directory, ranked within its branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleIdentity {
    pub id: String,
    pub display_name: String,
    pub branch: String,

    #[serde(default)]
    pub rank: u32,
}

impl RoleIdentity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            branch: branch.into(),
            rank: 0,
        }
    }

    /// Synthetic stand-in used when the directory has no eligible candidate,
    /// so the pipeline never stalls for lack of staff.
    pub fn simulation() -> Self {
        Self {
            id: "simulation".to_string(),
            display_name: "Simulated Coordinator".to_string(),
            branch: "simulation".to_string(),
            rank: 0,
        }
    }

    pub fn is_simulation(&self) -> bool {
        self.id == "simulation"
    }
}

/// The single coordinating identity for a program. Immutable once recorded;
/// only the assignment engine's load counters change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DukeAssignment {
    pub identity: RoleIdentity,
    pub program_id: String,
    pub assigned_at: DateTime<Utc>,
}

/// A per-task routing identity with the tasks round-robined onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlAssignment {
    pub identity: RoleIdentity,
    pub program_id: String,
    pub task_ids: Vec<String>,
    pub assigned_at: DateTime<Utc>,
}
