use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskLifecycleStatus {
    #[default]
    Pending,
    Activated,
    Accepted,
    Executing,
    Completed,
    Failed,
    Withdrawn,
    TimedOut,
    Declined,
}

impl TaskLifecycleStatus {
    /// Expected transition graph. Descriptive, not prescriptive: callers log
    /// transitions outside this table and apply them anyway.
    pub fn expected_transitions(&self) -> &'static [TaskLifecycleStatus] {
        use TaskLifecycleStatus::*;
        match self {
            Pending => &[Activated, Withdrawn],
            Activated => &[Accepted, Declined, TimedOut, Withdrawn, Completed],
            Accepted => &[Executing, Withdrawn, TimedOut],
            Executing => &[Completed, Failed, Withdrawn],
            Completed => &[],
            Failed => &[],
            Withdrawn => &[],
            TimedOut => &[],
            Declined => &[],
        }
    }

    pub fn expects_transition_to(&self, target: TaskLifecycleStatus) -> bool {
        self.expected_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Withdrawn | Self::TimedOut | Self::Declined
        )
    }

    /// Statuses the stale-task sweep considers in flight against a deadline.
    pub fn is_awaiting_cluster(&self) -> bool {
        matches!(self, Self::Activated | Self::Accepted)
    }
}

impl std::fmt::Display for TaskLifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Activated => "Activated",
            Self::Accepted => "Accepted",
            Self::Executing => "Executing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Withdrawn => "Withdrawn",
            Self::TimedOut => "Timed Out",
            Self::Declined => "Declined",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_transitions() {
        assert!(TaskLifecycleStatus::Pending.expects_transition_to(TaskLifecycleStatus::Activated));
        assert!(
            TaskLifecycleStatus::Activated.expects_transition_to(TaskLifecycleStatus::Declined)
        );
        assert!(TaskLifecycleStatus::Accepted.expects_transition_to(TaskLifecycleStatus::Executing));
        assert!(
            TaskLifecycleStatus::Executing.expects_transition_to(TaskLifecycleStatus::Completed)
        );
    }

    #[test]
    fn test_unexpected_transitions() {
        assert!(
            !TaskLifecycleStatus::Pending.expects_transition_to(TaskLifecycleStatus::Completed)
        );
        assert!(
            !TaskLifecycleStatus::Completed.expects_transition_to(TaskLifecycleStatus::Pending)
        );
        assert!(
            !TaskLifecycleStatus::Declined.expects_transition_to(TaskLifecycleStatus::Activated)
        );
    }

    #[test]
    fn test_terminal_set() {
        assert!(TaskLifecycleStatus::Completed.is_terminal());
        assert!(TaskLifecycleStatus::Failed.is_terminal());
        assert!(TaskLifecycleStatus::Withdrawn.is_terminal());
        assert!(TaskLifecycleStatus::TimedOut.is_terminal());
        assert!(TaskLifecycleStatus::Declined.is_terminal());
        assert!(!TaskLifecycleStatus::Pending.is_terminal());
        assert!(!TaskLifecycleStatus::Activated.is_terminal());
        assert!(!TaskLifecycleStatus::Executing.is_terminal());
    }

    #[test]
    fn test_awaiting_cluster() {
        assert!(TaskLifecycleStatus::Activated.is_awaiting_cluster());
        assert!(TaskLifecycleStatus::Accepted.is_awaiting_cluster());
        assert!(!TaskLifecycleStatus::Executing.is_awaiting_cluster());
        assert!(!TaskLifecycleStatus::Pending.is_awaiting_cluster());
    }
}
