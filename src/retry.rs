//! Retry/escalation engine: same-cluster retry discipline with a bounded
//! number of declines before a task is escalated to a blocker report.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{ChanceryError, Result};
use crate::events::AuditEvent;
use crate::lifecycle::TaskLifecycleManager;
use crate::program::{
    AdministrativeBlockerReport, BlockerSeverity, BlockerType, ExecutionProgram, RequestedAction,
    TaskLifecycleStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclineOutcome {
    /// A follow-up request was appended, targeting the same cluster.
    Reactivated { request_id: String },
    /// The retry bound is exhausted: task declined, blocker synthesized.
    Escalated { report_id: String },
}

pub struct RetryEscalationEngine {
    max_same_cluster_retries: u32,
}

impl RetryEscalationEngine {
    pub fn new(max_same_cluster_retries: u32) -> Self {
        Self {
            max_same_cluster_retries,
        }
    }

    /// Record a cluster decline for a task.
    ///
    /// Retries always target the original cluster: substituting a different
    /// executor for a declined task is disallowed outright. Once the bound is
    /// exhausted the task becomes Declined and a capacity blocker is
    /// synthesized instead of dropping the task silently.
    pub fn handle_decline(
        &self,
        program: &mut ExecutionProgram,
        lifecycle: &TaskLifecycleManager,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(DeclineOutcome, Vec<AuditEvent>)> {
        if let Some(status) = program.task_status(task_id).filter(|s| s.is_terminal()) {
            // Repeated decline reports for a settled task are idempotent:
            // hand back the blocker already on record, append nothing.
            if let Some(report) = program.blocker_reports.iter().find(|b| {
                b.blocker_type == BlockerType::CapacityUnavailable
                    && b.affected_task_ids.iter().any(|t| t == task_id)
            }) {
                return Ok((
                    DeclineOutcome::Escalated {
                        report_id: report.report_id.clone(),
                    },
                    Vec::new(),
                ));
            }
            return Err(ChanceryError::TaskAlreadySettled {
                program_id: program.program_id.clone(),
                task_id: task_id.to_string(),
                status: status.to_string(),
            });
        }

        let latest = program
            .latest_request_for(task_id)
            .cloned()
            .ok_or_else(|| ChanceryError::TaskNotFound {
                program_id: program.program_id.clone(),
                task_id: task_id.to_string(),
            })?;

        let mut events = vec![AuditEvent::cluster_declined(
            &program.program_id,
            task_id,
            &latest.target_cluster_id,
            latest.retry_count,
        )];

        if latest.retry_count < self.max_same_cluster_retries {
            let retry = latest.same_cluster_retry(now);
            info!(
                program_id = %program.program_id,
                task_id,
                cluster = %retry.target_cluster_id,
                retry_count = retry.retry_count,
                "reoffering declined task to its original cluster"
            );
            events.push(AuditEvent::reactivation_with_context(
                &program.program_id,
                &retry,
            ));
            let request_id = retry.request_id.clone();
            program.activation_requests.push(retry);
            program.touch();
            return Ok((DeclineOutcome::Reactivated { request_id }, events));
        }

        warn!(
            program_id = %program.program_id,
            task_id,
            cluster = %latest.target_cluster_id,
            declines = latest.retry_count + 1,
            "retry bound exhausted; escalating to blocker report"
        );
        events.extend(lifecycle.apply(program, task_id, TaskLifecycleStatus::Declined)?);

        let report = AdministrativeBlockerReport::new(
            &program.program_id,
            format!(
                "cluster {} declined task {} {} times",
                latest.target_cluster_id,
                task_id,
                latest.retry_count + 1
            ),
            BlockerType::CapacityUnavailable,
            BlockerSeverity::Major,
            RequestedAction::ReduceScope,
        )
        .with_affected_tasks(vec![task_id.to_string()]);

        events.push(AuditEvent::blocker_escalated(&program.program_id, &report));
        let report_id = report.report_id.clone();
        program.blocker_reports.push(report);
        program.touch();
        Ok((DeclineOutcome::Escalated { report_id }, events))
    }
}
