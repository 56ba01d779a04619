use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChanceryError, Result};

use super::assignment::{DukeAssignment, EarlAssignment};
use super::blocker::{AdministrativeBlockerReport, Disposition};
use super::request::TaskActivationRequest;
use super::snapshot::CapacitySnapshot;
use super::stage::{CompletionStatus, ProgramStage};
use super::status::TaskLifecycleStatus;
use super::TaskResultArtifact;

/// Aggregate root for one execution run of a ratified plan.
///
/// After the commit stage the record is append-only by convention: later
/// stages append to the lists below and update task statuses, they never
/// rewrite prior entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionProgram {
    pub program_id: String,
    pub execution_plan_id: String,
    pub motion_id: String,
    pub stage: ProgramStage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duke_assignment: Option<DukeAssignment>,

    #[serde(default)]
    pub earl_assignments: Vec<EarlAssignment>,

    /// task_id -> lifecycle status. BTreeMap keeps iteration deterministic.
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskLifecycleStatus>,

    #[serde(default)]
    pub activation_requests: Vec<TaskActivationRequest>,

    #[serde(default)]
    pub result_artifacts: Vec<TaskResultArtifact>,

    #[serde(default)]
    pub blocker_reports: Vec<AdministrativeBlockerReport>,

    /// Chronological; the last entry answers "current" queries.
    #[serde(default)]
    pub capacity_snapshots: Vec<CapacitySnapshot>,

    /// Set exactly once, when every task has reached a terminal status (or
    /// the program is explicitly halted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_status: Option<CompletionStatus>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionProgram {
    pub fn new(execution_plan_id: impl Into<String>, motion_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            program_id: uuid::Uuid::new_v4().to_string(),
            execution_plan_id: execution_plan_id.into(),
            motion_id: motion_id.into(),
            stage: ProgramStage::Intake,
            duke_assignment: None,
            earl_assignments: Vec::new(),
            tasks: BTreeMap::new(),
            activation_requests: Vec::new(),
            result_artifacts: Vec::new(),
            blocker_reports: Vec::new(),
            capacity_snapshots: Vec::new(),
            completion_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a later stage. Re-entering the current stage is a no-op
    /// (returns false); moving backwards is an error.
    pub fn advance_stage(&mut self, target: ProgramStage) -> Result<bool> {
        if !self.stage.can_advance_to(target) {
            return Err(ChanceryError::StageRewind {
                from: self.stage.to_string(),
                to: target.to_string(),
            });
        }
        if self.stage == target {
            return Ok(false);
        }
        self.stage = target;
        self.touch();
        Ok(true)
    }

    /// Register a task as Pending. Returns false if the task already exists;
    /// an existing entry is never overwritten.
    pub fn register_pending_task(&mut self, task_id: impl Into<String>) -> bool {
        let task_id = task_id.into();
        if self.tasks.contains_key(&task_id) {
            return false;
        }
        self.tasks.insert(task_id, TaskLifecycleStatus::Pending);
        self.touch();
        true
    }

    pub fn task_status(&self, task_id: &str) -> Option<TaskLifecycleStatus> {
        self.tasks.get(task_id).copied()
    }

    pub fn set_task_status(&mut self, task_id: &str, status: TaskLifecycleStatus) -> Result<()> {
        match self.tasks.get_mut(task_id) {
            Some(entry) => {
                *entry = status;
                self.touch();
                Ok(())
            }
            None => Err(ChanceryError::TaskNotFound {
                program_id: self.program_id.clone(),
                task_id: task_id.to_string(),
            }),
        }
    }

    pub fn pending_task_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|(_, status)| **status == TaskLifecycleStatus::Pending)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Newest activation request for a task, i.e. the tip of its retry chain.
    pub fn latest_request_for(&self, task_id: &str) -> Option<&TaskActivationRequest> {
        self.activation_requests
            .iter()
            .rev()
            .find(|r| r.task_id == task_id)
    }

    pub fn latest_snapshot(&self) -> Option<&CapacitySnapshot> {
        self.capacity_snapshots.last()
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(|status| status.is_terminal())
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|s| **s == TaskLifecycleStatus::Completed)
            .count()
    }

    pub fn failed_task_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|s| **s == TaskLifecycleStatus::Failed)
            .count()
    }

    pub fn declined_task_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|s| **s == TaskLifecycleStatus::Declined)
            .count()
    }

    pub fn unresolved_blockers(&self) -> impl Iterator<Item = &AdministrativeBlockerReport> {
        self.blocker_reports.iter().filter(|b| b.is_unresolved())
    }

    /// Honest completion verdict, evaluated once every task is terminal.
    ///
    /// Priority: Halted, then unresolved blockers, then majority failure,
    /// then accepted risks, then clean. The ordering guarantees a clean
    /// verdict is never reported while unresolved or failure conditions
    /// exist.
    pub fn derive_completion_status(&self) -> CompletionStatus {
        if self.completion_status == Some(CompletionStatus::Halted)
            || self.stage == ProgramStage::ViolationHandling
        {
            return CompletionStatus::Halted;
        }
        if self.unresolved_blockers().next().is_some() {
            return CompletionStatus::CompletedWithUnresolved;
        }
        if self.failed_task_count() * 2 > self.tasks.len() {
            return CompletionStatus::Failed;
        }
        if self
            .blocker_reports
            .iter()
            .any(|b| b.disposition == Some(Disposition::AcceptedRisk))
        {
            return CompletionStatus::CompletedWithAcceptedRisks;
        }
        CompletionStatus::CompletedClean
    }

    /// Persisted program record: the JSON shape consumed by downstream
    /// tooling mirrors this aggregate field for field.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::blocker::{BlockerSeverity, BlockerType, RequestedAction};

    fn program_with_tasks(statuses: &[(&str, TaskLifecycleStatus)]) -> ExecutionProgram {
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        for (id, status) in statuses {
            program.tasks.insert(id.to_string(), *status);
        }
        program
    }

    fn blocker(program_id: &str) -> AdministrativeBlockerReport {
        AdministrativeBlockerReport::new(
            program_id,
            "capacity exhausted",
            BlockerType::CapacityUnavailable,
            BlockerSeverity::Major,
            RequestedAction::ReduceScope,
        )
    }

    #[test]
    fn test_stage_advances_forward_only() {
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        assert!(program.advance_stage(ProgramStage::Feasibility).unwrap());
        assert!(program.advance_stage(ProgramStage::Commit).unwrap());
        assert!(program.advance_stage(ProgramStage::Feasibility).is_err());
        assert_eq!(program.stage, ProgramStage::Commit);
    }

    #[test]
    fn test_stage_reentry_is_noop() {
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        program.advance_stage(ProgramStage::Feasibility).unwrap();
        assert!(!program.advance_stage(ProgramStage::Feasibility).unwrap());
    }

    #[test]
    fn test_register_pending_never_overwrites() {
        let mut program = ExecutionProgram::new("plan-1", "motion-1");
        assert!(program.register_pending_task("task-1"));
        program
            .set_task_status("task-1", TaskLifecycleStatus::Completed)
            .unwrap();
        assert!(!program.register_pending_task("task-1"));
        assert_eq!(
            program.task_status("task-1"),
            Some(TaskLifecycleStatus::Completed)
        );
    }

    #[test]
    fn test_completion_clean_when_all_completed_no_blockers() {
        let program = program_with_tasks(&[
            ("a", TaskLifecycleStatus::Completed),
            ("b", TaskLifecycleStatus::Completed),
        ]);
        assert_eq!(
            program.derive_completion_status(),
            CompletionStatus::CompletedClean
        );
    }

    #[test]
    fn test_completion_accepted_risks() {
        let mut program = program_with_tasks(&[
            ("a", TaskLifecycleStatus::Completed),
            ("b", TaskLifecycleStatus::Completed),
        ]);
        let mut report = blocker(&program.program_id);
        report.disposition = Some(Disposition::AcceptedRisk);
        program.blocker_reports.push(report);
        assert_eq!(
            program.derive_completion_status(),
            CompletionStatus::CompletedWithAcceptedRisks
        );
    }

    #[test]
    fn test_completion_unresolved_beats_accepted_risks() {
        let mut program = program_with_tasks(&[("a", TaskLifecycleStatus::Completed)]);
        let mut accepted = blocker(&program.program_id);
        accepted.disposition = Some(Disposition::AcceptedRisk);
        program.blocker_reports.push(accepted);
        program.blocker_reports.push(blocker(&program.program_id));
        assert_eq!(
            program.derive_completion_status(),
            CompletionStatus::CompletedWithUnresolved
        );
    }

    #[test]
    fn test_completion_failed_when_majority_failed() {
        let program = program_with_tasks(&[
            ("a", TaskLifecycleStatus::Failed),
            ("b", TaskLifecycleStatus::Failed),
            ("c", TaskLifecycleStatus::Completed),
        ]);
        assert_eq!(program.derive_completion_status(), CompletionStatus::Failed);
    }

    #[test]
    fn test_completion_half_failed_is_not_failure() {
        let program = program_with_tasks(&[
            ("a", TaskLifecycleStatus::Failed),
            ("b", TaskLifecycleStatus::Completed),
        ]);
        assert_eq!(
            program.derive_completion_status(),
            CompletionStatus::CompletedClean
        );
    }

    #[test]
    fn test_completion_halted_wins_over_everything() {
        let mut program = program_with_tasks(&[("a", TaskLifecycleStatus::Failed)]);
        program.blocker_reports.push(blocker(&program.program_id));
        program.stage = ProgramStage::ViolationHandling;
        assert_eq!(program.derive_completion_status(), CompletionStatus::Halted);
    }

    #[test]
    fn test_from_json_rejects_malformed_record() {
        assert!(ExecutionProgram::from_json("{not a record").is_err());
    }

    #[test]
    fn test_serde_round_trip_preserves_record() {
        let mut program = program_with_tasks(&[
            ("a", TaskLifecycleStatus::Completed),
            ("b", TaskLifecycleStatus::Declined),
        ]);
        program.blocker_reports.push(blocker(&program.program_id));
        program.advance_stage(ProgramStage::Feasibility).unwrap();

        let json = program.to_json().unwrap();
        let restored = ExecutionProgram::from_json(&json).unwrap();

        assert_eq!(restored.tasks, program.tasks);
        assert_eq!(restored.stage, program.stage);
        assert_eq!(
            restored.blocker_reports.len(),
            program.blocker_reports.len()
        );
        assert_eq!(
            restored.blocker_reports[0].report_id,
            program.blocker_reports[0].report_id
        );
        assert_eq!(restored.completion_status, program.completion_status);
    }
}
