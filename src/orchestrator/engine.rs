use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::assignment::AssignmentEngine;
use crate::capacity::CapacitySnapshotEngine;
use crate::config::ChanceryConfig;
use crate::error::{ChanceryError, Result};
use crate::events::AuditEvent;
use crate::lifecycle::TaskLifecycleManager;
use crate::ports::{
    AuditPublisher, CapabilityExecutor, RoleDirectory, SimulatedAuditPublisher, SimulatedExecutor,
    SimulatedRoleDirectory,
};
use crate::program::{
    AdministrativeBlockerReport, BlockerSeverity, BlockerType, CapacityConfidence,
    CompletionStatus, ExecutionHandoff, ExecutionProgram, ProgramStage, RequestedAction,
    TaskActivationRequest, TaskLifecycleStatus, TaskResultArtifact, WorkPackage,
};
use crate::retry::{DeclineOutcome, RetryEscalationEngine};

/// Runs execution programs through their lifecycle stages.
///
/// One caller drives a given program end-to-end; programs are independent
/// units of work. The only state shared across programs is the assignment
/// engine's load counters.
pub struct ProgramOrchestrator {
    config: ChanceryConfig,
    executor: Arc<dyn CapabilityExecutor>,
    audit: Arc<dyn AuditPublisher>,
    directory: Arc<dyn RoleDirectory>,
    assignment: AssignmentEngine,
    capacity: CapacitySnapshotEngine,
    lifecycle: TaskLifecycleManager,
    retry: RetryEscalationEngine,
}

impl ProgramOrchestrator {
    pub fn new(
        config: ChanceryConfig,
        executor: Arc<dyn CapabilityExecutor>,
        audit: Arc<dyn AuditPublisher>,
        directory: Arc<dyn RoleDirectory>,
    ) -> Self {
        let assignment = AssignmentEngine::new(config.assignment.clone());
        let capacity = CapacitySnapshotEngine::new(config.capacity.clone());
        let retry = RetryEscalationEngine::new(config.orchestrator.max_same_cluster_retries);
        Self {
            config,
            executor,
            audit,
            directory,
            assignment,
            capacity,
            lifecycle: TaskLifecycleManager::new(),
            retry,
        }
    }

    /// Orchestrator wired entirely to simulation ports.
    pub fn simulated(config: ChanceryConfig) -> Self {
        Self::new(
            config,
            Arc::new(SimulatedExecutor::new()),
            Arc::new(SimulatedAuditPublisher::new()),
            Arc::new(SimulatedRoleDirectory::empty()),
        )
    }

    /// Stage A: build the aggregate, assign a coordinator, take the initial
    /// capacity snapshot.
    pub async fn intake(&self, handoff: &ExecutionHandoff) -> Result<ExecutionProgram> {
        if handoff.execution_plan_id.trim().is_empty() {
            return Err(ChanceryError::InvalidHandoff(
                "execution_plan_id is empty".to_string(),
            ));
        }
        if handoff.motion_id.trim().is_empty() {
            return Err(ChanceryError::InvalidHandoff("motion_id is empty".to_string()));
        }

        let mut program =
            ExecutionProgram::new(&handoff.execution_plan_id, &handoff.motion_id);
        info!(
            program_id = %program.program_id,
            execution_plan_id = %handoff.execution_plan_id,
            work_packages = handoff.work_packages.len(),
            "program intake"
        );

        let duke = self
            .assignment
            .select_duke(self.directory.as_ref(), &program.program_id);
        program.duke_assignment = Some(duke);

        self.publish(AuditEvent::program_created(
            &program.program_id,
            &handoff.execution_plan_id,
            &handoff.motion_id,
        ))
        .await;
        self.publish(AuditEvent::stage_entered(
            &program.program_id,
            ProgramStage::Intake,
        ))
        .await;

        self.refresh_capacity(&mut program).await;
        Ok(program)
    }

    /// Stage B: validate work packages. Failures become blocker reports, not
    /// stage failures: the stage advances no matter how many blockers were
    /// produced. Re-running over an already-processed handoff is a no-op.
    pub async fn run_feasibility(
        &self,
        program: &mut ExecutionProgram,
        handoff: &ExecutionHandoff,
    ) -> Result<()> {
        for work_package in &handoff.work_packages {
            let task_id = &work_package.work_package_id;
            if program.tasks.contains_key(task_id) || self.already_reported(program, task_id) {
                continue;
            }

            match Self::check_feasibility(handoff, work_package) {
                Ok(()) => {
                    program.register_pending_task(task_id.clone());
                }
                Err(report_seed) => {
                    let report = report_seed
                        .into_report(&program.program_id)
                        .with_affected_tasks(vec![task_id.clone()]);
                    warn!(
                        program_id = %program.program_id,
                        task_id = %task_id,
                        severity = ?report.severity,
                        "work package failed feasibility"
                    );
                    self.publish(AuditEvent::blocker_escalated(&program.program_id, &report))
                        .await;
                    program.blocker_reports.push(report);
                }
            }
        }
        self.enter_stage(program, ProgramStage::Feasibility).await
    }

    /// Stage C: no state change beyond the transition. Marks the point after
    /// which the record is treated as append-only.
    pub async fn commit(&self, program: &mut ExecutionProgram) -> Result<()> {
        self.enter_stage(program, ProgramStage::Commit).await
    }

    /// Stage D: refresh capacity, distribute routers, activate every pending
    /// task against its cluster. Executor failures are recorded, logged, and
    /// swallowed; they never propagate out of the stage.
    pub async fn activate(
        &self,
        program: &mut ExecutionProgram,
        handoff: &ExecutionHandoff,
    ) -> Result<()> {
        self.enter_stage(program, ProgramStage::Activation).await?;
        self.refresh_capacity(program).await;

        let pending = program.pending_task_ids();
        let earls =
            self.assignment
                .distribute_earls(self.directory.as_ref(), &program.program_id, &pending);
        let mut router_of_task: std::collections::HashMap<&str, &str> =
            std::collections::HashMap::new();
        for earl in &earls {
            for task_id in &earl.task_ids {
                router_of_task.insert(task_id.as_str(), earl.identity.id.as_str());
            }
        }

        let now = Utc::now();
        let mut requests = Vec::with_capacity(pending.len());
        for task_id in &pending {
            let Some(work_package) = handoff.work_package(task_id) else {
                warn!(
                    program_id = %program.program_id,
                    task_id = %task_id,
                    "pending task has no work package in handoff; skipping activation"
                );
                continue;
            };
            let router_id = router_of_task.get(task_id.as_str()).copied().unwrap_or("simulation");
            requests.push(self.build_request(program, work_package, router_id, now));
        }
        program.earl_assignments.extend(earls);

        for request in requests {
            if let Some(flagged) =
                self.lifecycle
                    .apply(program, &request.task_id, TaskLifecycleStatus::Activated)?
            {
                self.publish(flagged).await;
            }
            self.publish(AuditEvent::task_activated(&program.program_id, &request))
                .await;
            program.activation_requests.push(request.clone());

            match self.executor.execute(&request).await {
                Ok(artifact) => {
                    program.result_artifacts.push(artifact);
                    if let Some(flagged) = self.lifecycle.apply(
                        program,
                        &request.task_id,
                        TaskLifecycleStatus::Completed,
                    )? {
                        self.publish(flagged).await;
                    }
                }
                Err(err) => {
                    // Attempt recorded but unresolved; the task stays
                    // Activated and the stage keeps going.
                    warn!(
                        program_id = %program.program_id,
                        task_id = %request.task_id,
                        cluster = %request.target_cluster_id,
                        error = %err,
                        "executor failed; leaving task activated"
                    );
                }
            }
        }
        Ok(())
    }

    /// Stage E: ingest externally supplied artifacts, refresh the acceptance
    /// rate, re-escalate unresolved critical blockers, and derive the
    /// completion status once every task is terminal.
    pub async fn ingest_results(
        &self,
        program: &mut ExecutionProgram,
        artifacts: Vec<TaskResultArtifact>,
    ) -> Result<()> {
        self.enter_stage(program, ProgramStage::Results).await?;

        for artifact in artifacts {
            if program.task_status(&artifact.task_id).is_none() {
                warn!(
                    program_id = %program.program_id,
                    task_id = %artifact.task_id,
                    result_id = %artifact.result_id,
                    "artifact references unknown task; skipping"
                );
                continue;
            }
            let task_id = artifact.task_id.clone();
            program.result_artifacts.push(artifact);
            if let Some(flagged) =
                self.lifecycle
                    .apply(program, &task_id, TaskLifecycleStatus::Completed)?
            {
                self.publish(flagged).await;
            }
        }

        self.refresh_capacity(program).await;

        let reescalations: Vec<AuditEvent> = program
            .unresolved_blockers()
            .filter(|b| b.severity == BlockerSeverity::Critical)
            .map(|b| AuditEvent::blocker_escalated(&program.program_id, b))
            .collect();
        for event in reescalations {
            self.publish(event).await;
        }

        if program.completion_status.is_none() && program.all_tasks_terminal() {
            let status = program.derive_completion_status();
            info!(
                program_id = %program.program_id,
                %status,
                "all tasks terminal; completion status derived"
            );
            program.completion_status = Some(status);
            program.touch();
            if let Some(duke) = &program.duke_assignment {
                self.assignment.release_duke(duke);
            }
        }
        Ok(())
    }

    /// Stage F: designed escape hatch, not an error path. Halting is a
    /// valid, non-failure terminal state.
    pub async fn handle_violation(
        &self,
        program: &mut ExecutionProgram,
        reason: &str,
    ) -> Result<()> {
        self.enter_stage(program, ProgramStage::ViolationHandling)
            .await?;
        program.completion_status = Some(CompletionStatus::Halted);
        program.touch();
        if let Some(duke) = &program.duke_assignment {
            self.assignment.release_duke(duke);
        }
        self.publish(AuditEvent::program_halted(&program.program_id, reason))
            .await;
        Ok(())
    }

    /// Record a cluster decline. Retries target the original cluster only;
    /// exhaustion produces a blocker report instead of a dropped task.
    pub async fn record_cluster_decline(
        &self,
        program: &mut ExecutionProgram,
        task_id: &str,
    ) -> Result<DeclineOutcome> {
        let (outcome, events) =
            self.retry
                .handle_decline(program, &self.lifecycle, task_id, Utc::now())?;
        for event in events {
            self.publish(event).await;
        }
        Ok(outcome)
    }

    /// Stale-task sweep: time out overdue activated/accepted tasks. Returns
    /// how many tasks were timed out.
    pub async fn sweep_stale_tasks(&self, program: &mut ExecutionProgram) -> usize {
        let events = self.lifecycle.sweep_stale(program, Utc::now());
        let timed_out = events
            .iter()
            .filter(|e| e.event_type == "administrative.task.timed_out")
            .count();
        for event in events {
            self.publish(event).await;
        }
        timed_out
    }

    fn check_feasibility(
        handoff: &ExecutionHandoff,
        work_package: &WorkPackage,
    ) -> std::result::Result<(), BlockerSeed> {
        if work_package.scope_description.trim().is_empty() {
            return Err(BlockerSeed {
                summary: format!(
                    "work package {} has no scope description",
                    work_package.work_package_id
                ),
                blocker_type: BlockerType::MissingScope,
                severity: BlockerSeverity::Critical,
            });
        }
        if handoff.epic(&work_package.epic_id).is_none() {
            return Err(BlockerSeed {
                summary: format!(
                    "work package {} references unknown epic {}",
                    work_package.work_package_id, work_package.epic_id
                ),
                blocker_type: BlockerType::UnresolvedEpic,
                severity: BlockerSeverity::Major,
            });
        }
        Ok(())
    }

    fn already_reported(&self, program: &ExecutionProgram, task_id: &str) -> bool {
        program
            .blocker_reports
            .iter()
            .any(|b| b.affected_task_ids.iter().any(|t| t == task_id))
    }

    fn build_request(
        &self,
        program: &ExecutionProgram,
        work_package: &WorkPackage,
        router_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> TaskActivationRequest {
        TaskActivationRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            task_id: work_package.work_package_id.clone(),
            program_id: program.program_id.clone(),
            router_id: router_id.to_string(),
            scope_description: work_package.scope_description.clone(),
            constraints: work_package.constraints.clone(),
            success_definition: work_package.success_definition.clone(),
            required_capabilities: work_package.required_capabilities.clone(),
            action_reversibility: work_package.action_reversibility,
            activation_deadline: now + Duration::days(self.config.orchestrator.soft_deadline_days),
            max_deadline: now + Duration::days(self.config.orchestrator.hard_deadline_days),
            target_cluster_id: work_package.target_cluster_id.clone(),
            retry_count: 0,
            original_request_id: None,
            created_at: now,
        }
    }

    async fn refresh_capacity(&self, program: &mut ExecutionProgram) {
        let snapshot = self.capacity.refresh(program, Utc::now());
        self.publish(AuditEvent::snapshot_refreshed(&program.program_id, &snapshot))
            .await;
        if snapshot.confidence == CapacityConfidence::Low {
            self.publish(AuditEvent::capacity_stale_warning(
                &program.program_id,
                &snapshot,
            ))
            .await;
        }
        program.capacity_snapshots.push(snapshot);
        program.touch();
    }

    async fn enter_stage(&self, program: &mut ExecutionProgram, stage: ProgramStage) -> Result<()> {
        if program.advance_stage(stage)? {
            self.publish(AuditEvent::stage_entered(&program.program_id, stage))
                .await;
        }
        Ok(())
    }

    /// Best-effort publication: a broken audit sink never blocks progress.
    async fn publish(&self, event: AuditEvent) {
        let event_type = event.event_type.clone();
        if let Err(err) = self.audit.publish(event).await {
            debug!(%event_type, error = %err, "audit publish failed; event dropped");
        }
    }
}

struct BlockerSeed {
    summary: String,
    blocker_type: BlockerType,
    severity: BlockerSeverity,
}

impl BlockerSeed {
    fn into_report(self, program_id: &str) -> AdministrativeBlockerReport {
        AdministrativeBlockerReport::new(
            program_id,
            self.summary,
            self.blocker_type,
            self.severity,
            RequestedAction::ReviseHandoff,
        )
    }
}
