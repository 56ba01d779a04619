//! Task lifecycle manager: applies status transitions against the expected
//! transition graph and flags, but never blocks, transitions outside it.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::AuditEvent;
use crate::program::{ExecutionProgram, TaskLifecycleStatus};

#[derive(Default)]
pub struct TaskLifecycleManager;

impl TaskLifecycleManager {
    pub fn new() -> Self {
        Self
    }

    /// Apply a transition. Descriptive, not prescriptive: a transition
    /// outside the expected graph yields an unusual-transition event for the
    /// caller to publish, and is applied anyway.
    pub fn apply(
        &self,
        program: &mut ExecutionProgram,
        task_id: &str,
        to: TaskLifecycleStatus,
    ) -> Result<Option<AuditEvent>> {
        let from = program
            .task_status(task_id)
            .unwrap_or(TaskLifecycleStatus::Pending);

        let flagged = if from.expects_transition_to(to) {
            debug!(program_id = %program.program_id, task_id, %from, %to, "task transition");
            None
        } else {
            warn!(
                program_id = %program.program_id,
                task_id,
                %from,
                %to,
                "unusual task transition; applying anyway"
            );
            Some(AuditEvent::unusual_transition(
                &program.program_id,
                task_id,
                from,
                to,
            ))
        };

        program.set_task_status(task_id, to)?;
        Ok(flagged)
    }

    /// Stale-task sweep: any Activated or Accepted task whose newest
    /// request's soft deadline has passed becomes TimedOut. Deadlines are
    /// data, compared retroactively; nothing cancels the in-flight work.
    pub fn sweep_stale(
        &self,
        program: &mut ExecutionProgram,
        now: DateTime<Utc>,
    ) -> Vec<AuditEvent> {
        let overdue: Vec<(String, DateTime<Utc>)> = program
            .tasks
            .iter()
            .filter(|(_, status)| status.is_awaiting_cluster())
            .filter_map(|(task_id, _)| {
                program
                    .latest_request_for(task_id)
                    .filter(|request| request.activation_deadline < now)
                    .map(|request| (task_id.clone(), request.activation_deadline))
            })
            .collect();

        let mut events = Vec::with_capacity(overdue.len());
        for (task_id, deadline) in overdue {
            warn!(
                program_id = %program.program_id,
                task_id = %task_id,
                %deadline,
                "task overdue; timing out"
            );
            // Activated -> TimedOut and Accepted -> TimedOut are both
            // expected transitions, so apply cannot flag them.
            if let Ok(flagged) = self.apply(program, &task_id, TaskLifecycleStatus::TimedOut) {
                events.extend(flagged);
                events.push(AuditEvent::task_timed_out(
                    &program.program_id,
                    &task_id,
                    deadline,
                ));
            }
        }
        events
    }
}
