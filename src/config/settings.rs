use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{ChanceryError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChanceryConfig {
    pub orchestrator: OrchestratorConfig,
    pub capacity: CapacityConfig,
    pub assignment: AssignmentConfig,
}

impl ChanceryConfig {
    pub async fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, config_dir: &Path) -> Result<()> {
        self.validate()?;
        let config_path = config_dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| ChanceryError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.orchestrator.soft_deadline_days == 0 {
            errors.push("soft_deadline_days must be greater than 0");
        }
        if self.orchestrator.soft_deadline_days >= self.orchestrator.hard_deadline_days {
            errors.push("soft_deadline_days must be less than hard_deadline_days");
        }
        if self.assignment.max_concurrent_programs == 0 {
            errors.push("max_concurrent_programs must be greater than 0");
        }
        if self.capacity.high_confidence_max_secs >= self.capacity.medium_confidence_max_secs {
            errors.push("high_confidence_max_secs must be less than medium_confidence_max_secs");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ChanceryError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Soft activation deadline, in days from activation. Overdue tasks are
    /// swept to TimedOut by the stale-task sweep.
    pub soft_deadline_days: i64,
    /// Hard ceiling on the activation window, in days from activation.
    pub hard_deadline_days: i64,
    /// Declines tolerated before a task is escalated to a blocker report.
    pub max_same_cluster_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            soft_deadline_days: 7,
            hard_deadline_days: 30,
            max_same_cluster_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Snapshot age below which capacity confidence stays High.
    pub high_confidence_max_secs: u64,
    /// Snapshot age below which capacity confidence stays Medium.
    pub medium_confidence_max_secs: u64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            high_confidence_max_secs: 3_600,
            medium_confidence_max_secs: 14_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Concurrency ceiling per coordinating identity.
    pub max_concurrent_programs: u32,
    /// Role-directory branch the coordinator and router pools are drawn from.
    pub administrative_branch: String,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_programs: 3,
            administrative_branch: "administrative".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ChanceryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_deadline_ordering_enforced() {
        let mut config = ChanceryConfig::default();
        config.orchestrator.soft_deadline_days = 30;
        config.orchestrator.hard_deadline_days = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let mut config = ChanceryConfig::default();
        config.assignment.max_concurrent_programs = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChanceryConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.orchestrator.max_same_cluster_retries, 2);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChanceryConfig::default();
        config.orchestrator.max_same_cluster_retries = 5;
        config.save(dir.path()).await.unwrap();

        let loaded = ChanceryConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded.orchestrator.max_same_cluster_retries, 5);
    }
}
