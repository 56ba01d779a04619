//! Capacity snapshot engine: point-in-time confidence and acceptance rate
//! for a program, with confidence decaying as the previous snapshot ages.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::CapacityConfig;
use crate::program::{CapacityConfidence, CapacitySnapshot, ExecutionProgram};

pub struct CapacitySnapshotEngine {
    config: CapacityConfig,
}

impl CapacitySnapshotEngine {
    pub fn new(config: CapacityConfig) -> Self {
        Self { config }
    }

    /// Compute a fresh snapshot. The caller appends it to the program's
    /// chronological history; prior snapshots are never rewritten.
    pub fn refresh(&self, program: &ExecutionProgram, now: DateTime<Utc>) -> CapacitySnapshot {
        let confidence = self.confidence(program.latest_snapshot(), now);
        let acceptance_rate = Self::acceptance_rate(program);
        debug!(
            program_id = %program.program_id,
            %confidence,
            acceptance_rate,
            "capacity snapshot refreshed"
        );
        CapacitySnapshot::new(now, program.tasks.len(), confidence, acceptance_rate)
    }

    /// Confidence decays with the age of the previous snapshot. A previous
    /// timestamp that cannot be placed in the past (clock skew) is treated
    /// as Low: fail-safe, not fail-open.
    pub fn confidence(
        &self,
        previous: Option<&CapacitySnapshot>,
        now: DateTime<Utc>,
    ) -> CapacityConfidence {
        let previous = match previous {
            Some(snapshot) => snapshot,
            None => return CapacityConfidence::High,
        };
        let age = match now.signed_duration_since(previous.timestamp).to_std() {
            Ok(age) => age,
            Err(_) => return CapacityConfidence::Low,
        };
        if age.as_secs() <= self.config.high_confidence_max_secs {
            CapacityConfidence::High
        } else if age.as_secs() <= self.config.medium_confidence_max_secs {
            CapacityConfidence::Medium
        } else {
            CapacityConfidence::Low
        }
    }

    /// completed / (completed + declined) among decided task outcomes,
    /// defaulting to 1.0 when nothing has been decided yet.
    pub fn acceptance_rate(program: &ExecutionProgram) -> f64 {
        let completed = program.completed_task_count();
        let declined = program.declined_task_count();
        let decided = completed + declined;
        if decided == 0 {
            return 1.0;
        }
        completed as f64 / decided as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::program::TaskLifecycleStatus;

    fn engine() -> CapacitySnapshotEngine {
        CapacitySnapshotEngine::new(CapacityConfig::default())
    }

    fn snapshot_aged(secs: i64) -> CapacitySnapshot {
        CapacitySnapshot::new(
            Utc::now() - Duration::seconds(secs),
            0,
            CapacityConfidence::High,
            1.0,
        )
    }

    #[test]
    fn test_no_previous_snapshot_is_high() {
        assert_eq!(
            engine().confidence(None, Utc::now()),
            CapacityConfidence::High
        );
    }

    #[test]
    fn test_confidence_decay_thresholds() {
        let engine = engine();
        let now = Utc::now();
        assert_eq!(
            engine.confidence(Some(&snapshot_aged(1_800)), now),
            CapacityConfidence::High
        );
        assert_eq!(
            engine.confidence(Some(&snapshot_aged(7_200)), now),
            CapacityConfidence::Medium
        );
        assert_eq!(
            engine.confidence(Some(&snapshot_aged(20_000)), now),
            CapacityConfidence::Low
        );
    }

    #[test]
    fn test_future_timestamp_is_low() {
        // Clock skew: previous snapshot claims to be from the future.
        assert_eq!(
            engine().confidence(Some(&snapshot_aged(-600)), Utc::now()),
            CapacityConfidence::Low
        );
    }

    #[test]
    fn test_acceptance_rate_defaults_to_one() {
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        program.register_pending_task("task-1");
        assert_eq!(CapacitySnapshotEngine::acceptance_rate(&program), 1.0);
    }

    #[test]
    fn test_acceptance_rate_counts_only_decided_outcomes() {
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        for (id, status) in [
            ("a", TaskLifecycleStatus::Completed),
            ("b", TaskLifecycleStatus::Completed),
            ("c", TaskLifecycleStatus::Declined),
            ("d", TaskLifecycleStatus::Activated),
            ("e", TaskLifecycleStatus::Failed),
        ] {
            program.tasks.insert(id.to_string(), status);
        }
        // 2 completed, 1 declined; activated and failed do not count.
        let rate = CapacitySnapshotEngine::acceptance_rate(&program);
        assert!((rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_refresh_uses_latest_snapshot_age() {
        let engine = engine();
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        program.capacity_snapshots.push(snapshot_aged(20_000));

        let snapshot = engine.refresh(&program, Utc::now());
        assert_eq!(snapshot.confidence, CapacityConfidence::Low);
        assert_eq!(snapshot.total_tasks, 0);
    }
}
