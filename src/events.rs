//! Audit-grade events for the administrative delivery layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::program::{
    AdministrativeBlockerReport, CapacitySnapshot, ProgramStage, TaskActivationRequest,
    TaskLifecycleStatus,
};

pub const EVENT_SOURCE: &str = "administrative";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// One audit-trail entry. Publication is fire-and-forget: a failed publish is
/// swallowed by the caller and never reaches program logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub ts: DateTime<Utc>,
    pub source: String,
    pub program_id: String,
    pub payload: serde_json::Value,
    pub severity: AuditSeverity,
}

impl AuditEvent {
    pub fn new(
        event_type: impl Into<String>,
        program_id: impl Into<String>,
        payload: serde_json::Value,
        severity: AuditSeverity,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            ts: Utc::now(),
            source: EVENT_SOURCE.to_string(),
            program_id: program_id.into(),
            payload,
            severity,
        }
    }

    pub fn program_created(program_id: &str, execution_plan_id: &str, motion_id: &str) -> Self {
        Self::new(
            "administrative.program.created",
            program_id,
            json!({
                "execution_plan_id": execution_plan_id,
                "motion_id": motion_id,
            }),
            AuditSeverity::Info,
        )
    }

    pub fn stage_entered(program_id: &str, stage: ProgramStage) -> Self {
        Self::new(
            "administrative.program.stage_entered",
            program_id,
            json!({ "stage": stage }),
            AuditSeverity::Info,
        )
    }

    pub fn task_activated(program_id: &str, request: &TaskActivationRequest) -> Self {
        Self::new(
            "administrative.task.activated",
            program_id,
            json!({
                "task_id": request.task_id,
                "request_id": request.request_id,
                "target_cluster_id": request.target_cluster_id,
                "router_id": request.router_id,
            }),
            AuditSeverity::Info,
        )
    }

    pub fn cluster_declined(program_id: &str, task_id: &str, cluster_id: &str, retry_count: u32) -> Self {
        Self::new(
            "administrative.task.cluster_declined",
            program_id,
            json!({
                "task_id": task_id,
                "cluster_id": cluster_id,
                "retry_count": retry_count,
            }),
            AuditSeverity::Warning,
        )
    }

    pub fn reactivation_with_context(program_id: &str, request: &TaskActivationRequest) -> Self {
        Self::new(
            "administrative.task.reactivation_with_context",
            program_id,
            json!({
                "task_id": request.task_id,
                "request_id": request.request_id,
                "original_request_id": request.original_request_id,
                "target_cluster_id": request.target_cluster_id,
                "retry_count": request.retry_count,
            }),
            AuditSeverity::Info,
        )
    }

    pub fn task_timed_out(program_id: &str, task_id: &str, deadline: DateTime<Utc>) -> Self {
        Self::new(
            "administrative.task.timed_out",
            program_id,
            json!({
                "task_id": task_id,
                "activation_deadline": deadline,
            }),
            AuditSeverity::Warning,
        )
    }

    pub fn unusual_transition(
        program_id: &str,
        task_id: &str,
        from: TaskLifecycleStatus,
        to: TaskLifecycleStatus,
    ) -> Self {
        Self::new(
            "administrative.task.unusual_transition",
            program_id,
            json!({
                "task_id": task_id,
                "from": from,
                "to": to,
            }),
            AuditSeverity::Warning,
        )
    }

    pub fn blocker_escalated(program_id: &str, report: &AdministrativeBlockerReport) -> Self {
        Self::new(
            "administrative.blocker.escalated",
            program_id,
            json!({
                "report_id": report.report_id,
                "blocker_type": report.blocker_type,
                "severity": report.severity,
                "affected_task_ids": report.affected_task_ids,
                "requested_action": report.requested_action,
            }),
            AuditSeverity::Warning,
        )
    }

    pub fn snapshot_refreshed(program_id: &str, snapshot: &CapacitySnapshot) -> Self {
        Self::new(
            "administrative.capacity.snapshot_refreshed",
            program_id,
            json!({
                "snapshot_id": snapshot.snapshot_id,
                "confidence": snapshot.confidence,
                "acceptance_rate": snapshot.acceptance_rate,
                "total_tasks": snapshot.total_tasks,
            }),
            AuditSeverity::Info,
        )
    }

    pub fn capacity_stale_warning(program_id: &str, snapshot: &CapacitySnapshot) -> Self {
        Self::new(
            "administrative.capacity.stale_warning",
            program_id,
            json!({
                "snapshot_id": snapshot.snapshot_id,
                "confidence": snapshot.confidence,
            }),
            AuditSeverity::Warning,
        )
    }

    pub fn program_halted(program_id: &str, reason: &str) -> Self {
        Self::new(
            "administrative.program.halted",
            program_id,
            json!({ "reason": reason }),
            AuditSeverity::Critical,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_carry_administrative_source() {
        let event = AuditEvent::program_created("prog-1", "plan-1", "motion-1");
        assert_eq!(event.source, "administrative");
        assert_eq!(event.event_type, "administrative.program.created");
        assert_eq!(event.severity, AuditSeverity::Info);
    }

    #[test]
    fn test_halted_is_critical() {
        let event = AuditEvent::program_halted("prog-1", "constitutional violation");
        assert_eq!(event.severity, AuditSeverity::Critical);
        assert_eq!(event.payload["reason"], "constitutional violation");
    }

    #[test]
    fn test_unusual_transition_payload() {
        let event = AuditEvent::unusual_transition(
            "prog-1",
            "task-1",
            TaskLifecycleStatus::Pending,
            TaskLifecycleStatus::Completed,
        );
        assert_eq!(event.payload["from"], "pending");
        assert_eq!(event.payload["to"], "completed");
        assert_eq!(event.severity, AuditSeverity::Warning);
    }
}
