use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time estimate of how much trust to place in capacity data.
/// Immutable once created; a newer snapshot supersedes it for "current"
/// queries but history is retained on the program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub snapshot_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_tasks: usize,
    pub confidence: CapacityConfidence,
    /// completed / (completed + declined), 1.0 while nothing has been decided.
    pub acceptance_rate: f64,
}

impl CapacitySnapshot {
    pub fn new(
        timestamp: DateTime<Utc>,
        total_tasks: usize,
        confidence: CapacityConfidence,
        acceptance_rate: f64,
    ) -> Self {
        Self {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            total_tasks,
            confidence,
            acceptance_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityConfidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for CapacityConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        write!(f, "{}", s)
    }
}
